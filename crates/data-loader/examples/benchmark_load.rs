use data_loader::Roster;
use std::path::Path;
use std::time::Instant;

fn main() {
    let path = Path::new("data/roster.csv");

    println!("Loading roster...\n");

    let start = Instant::now();
    let roster = Roster::load_from_file(path)
        .expect("Failed to load roster");
    let elapsed = start.elapsed();

    let stats = roster.stats();

    println!("\n=== Load Complete ===");
    println!("Time taken: {:?}", elapsed);
    println!("Records: {}", stats.records);
    println!("Specialities: {}", stats.specialities);
    println!("Regions: {}", stats.regions);
    println!("States: {}", stats.states);
    println!("\nPerformance: {:.0} records/second",
             stats.records as f64 / elapsed.as_secs_f64());
}
