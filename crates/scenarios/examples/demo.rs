//! Demo of the sweep definitions
use scenarios::*;

fn main() {
    println!("Sweep Definitions Demo");
    println!("======================\n");

    println!("Presets:");
    for name in Presets::names() {
        if let Some(sweep) = Presets::by_name(name) {
            println!("  {:<8} - {} runs", name, sweep.run_count());
        }
    }

    let sweep = Presets::full_sweep();
    println!("\nFull sweep, in execution order:");
    for run in sweep.runs().iter().take(8) {
        println!(
            "  {:<24} seed {:#018x}  ({})",
            run.name(),
            run.seed(sweep.base_seed),
            run
        );
    }
    println!("  ... {} more", sweep.run_count() - 8);

    println!("\nSchedule:");
    let schedule = &sweep.schedule;
    println!(
        "  server {:?}..{:?}, clients {:?}..{:?}, deadline {:?}",
        schedule.server.start,
        schedule.server.stop,
        schedule.client.start,
        schedule.client.stop,
        schedule.deadline
    );

    let custom = SweepBuilder::new()
        .client_counts(vec![4, 8])
        .protocols(vec![ProtocolMode::Mixed])
        .pin_role(NodeRole::Server, MotionKind::Fixed)
        .pin_role(NodeRole::AccessPoint, MotionKind::Fixed)
        .format(ArtifactFormat::Csv)
        .build();
    match custom {
        Ok(sweep) => {
            println!("\nCustom sweep ({} runs):", sweep.run_count());
            match serde_json::to_string_pretty(&sweep) {
                Ok(json) => println!("{}", json),
                Err(e) => println!("  cannot serialize: {}", e),
            }
        }
        Err(e) => println!("\nInvalid sweep: {}", e),
    }
}
