use anyhow::Result;
use vergen::EmitBuilder;

// git metadata and build time for `live_tracker --version`
fn main() -> Result<()> {
    EmitBuilder::builder()
        .build_timestamp()
        .git_sha(true)
        .git_commit_date()
        .emit()?;
    Ok(())
}
