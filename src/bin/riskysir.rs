use riskysir::runner::run_with_args;

fn main() -> anyhow::Result<()> {
    run_with_args()?;
    Ok(())
}
