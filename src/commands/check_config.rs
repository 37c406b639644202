use clap::ArgMatches;

pub fn run(matches: &ArgMatches) {
    let config = match super::load_config(matches) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("✗ Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    match toml::to_string_pretty(&config) {
        Ok(rendered) => {
            println!("✓ Configuration is valid\n");
            print!("{}", rendered);
        }
        Err(e) => {
            eprintln!("✗ Failed to render configuration: {}", e);
            std::process::exit(1);
        }
    }
}
