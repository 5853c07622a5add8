/// The xtask binary delegates entirely to nih_plug_xtask, which provides
/// the `bundle` subcommand. Usage:
///
///   cargo xtask bundle loveless-spatial --release
///
/// This compiles the plugins as a cdylib and packages them into
/// `target/bundled/Loveless Spatial.vst3` and `.clap` bundles.
fn main() -> nih_plug_xtask::Result<()> {
    nih_plug_xtask::main()
}
