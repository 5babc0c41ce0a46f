use std::io::Cursor;

use hwbench_core::BenchConfig;
use hwbench_engine::{Bench, Line, MemoryLogSink, SharedBench};

const SCRIPT: &str = "\
addDev BME280 0 0
addDev LCD 1 0
addDev Wifi 2 0
turnON 0
turnON 1
turnON 2
readSensor 0
printDisplay 0 Temp OK
writeWireless 0 telemetry ready
readWireless 0
list ports
exit
";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let config = BenchConfig {
        ports: vec!["SPI".into(), "I2C".into(), "UART".into()],
        max_sensors: 2,
        max_displays: 1,
        max_wireless_adapters: 1,
        max_motor_drivers: 0,
    };

    println!("Running a scripted session...");
    let sink = MemoryLogSink::new();
    let mut bench = Bench::from_config(&config, sink.clone());
    let summary = bench.run(Cursor::new(SCRIPT), |line| match line {
        Line::Out(text) => println!("  {}", text),
        Line::Err(text) => eprintln!("  {}", text),
    })?;
    println!(
        "Executed {} of {} queued commands",
        summary.executed, summary.queued
    );

    for log in sink.logs() {
        println!("{}:", log.file_name());
        for entry in &log.entries {
            println!("  {}", entry);
        }
    }

    // The same bench driven from another thread
    let shared = SharedBench::new(bench);
    let worker = {
        let shared = shared.clone();
        std::thread::spawn(move || shared.execute("list sensor"))
    };
    for line in worker.join().map_err(|_| "worker panicked")?? {
        println!("{}", line);
    }

    Ok(())
}
