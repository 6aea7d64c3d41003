use anyhow::Result;

fn main() -> Result<()> {
    ontoshacl_cli::run()
}
