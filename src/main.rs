fn main() -> anyhow::Result<()> {
    helpdesk_agent::run()?;
    Ok(())
}
