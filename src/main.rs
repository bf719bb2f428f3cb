fn main() -> anyhow::Result<()> {
    branding_picker::cli::run()
}
