fn main() -> anyhow::Result<()> {
    folio::about::run()
}
