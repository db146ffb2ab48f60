use anyhow::Result;
use human_panic::setup_panic;

fn main() -> Result<()> {
    setup_panic!();

    bluecarbon::cli::run_cli()
}
