use clap::{Arg, Command};
use std::process;

#[tokio::main]
async fn main() {
    let matches = Command::new("etl-cli")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Builds the songplays star schema from song and log JSON")
        .subcommand(
            Command::new("etl")
                .about("Run the star schema pipeline")
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .value_name("FILE")
                        .help("Pipeline config file (default: config/etl.toml)"),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("etl", etl_matches)) => {
            let config_path = etl_matches
                .get_one::<String>("config")
                .map(|s| s.as_str())
                .unwrap_or("config/etl.toml");
            println!("Starting star schema pipeline with config: {}", config_path);

            match etl::run_etl_pipeline(config_path).await {
                Ok(report) => {
                    for table in &report.tables {
                        println!("{:<10} {:>10} rows  {}", table.table_name, table.rows, table.path);
                    }
                    println!("Run {} completed", report.run_id);
                }
                Err(e) => {
                    eprintln!("ETL pipeline error: {}", e);
                    process::exit(1);
                }
            }
        }
        _ => {
            eprintln!("Please specify a valid subcommand");
            process::exit(1);
        }
    }
}
