use vergen_gix::{BuildBuilder, Emitter, GixBuilder, RustcBuilder};

// Emits VERGEN_BUILD_TIMESTAMP, VERGEN_GIT_SHA and VERGEN_RUSTC_* for the
// `version` subcommand and /api/v1/version.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let build = BuildBuilder::default().build_timestamp(true).build()?;
    let git = GixBuilder::default().sha(true).build()?;
    let rustc = RustcBuilder::default()
        .semver(true)
        .channel(true)
        .host_triple(true)
        .llvm_version(true)
        .build()?;

    Emitter::default()
        .add_instructions(&build)?
        .add_instructions(&git)?
        .add_instructions(&rustc)?
        .emit()?;

    Ok(())
}
