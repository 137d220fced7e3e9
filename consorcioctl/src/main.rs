use clap::Parser;

fn main() {
    consorcioctl::init_tracing();
    let cli = consorcioctl::Cli::parse();
    if let Err(err) = consorcioctl::run(cli) {
        eprintln!("erro: {err}");
        std::process::exit(1);
    }
}
