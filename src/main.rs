use anyhow::Context;

fn main() -> anyhow::Result<()> {
    hwledger::run().context("hwledger command failed")?;
    Ok(())
}
