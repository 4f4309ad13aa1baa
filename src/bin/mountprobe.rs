use anyhow::Result;

fn main() -> Result<()> {
    mountprobe::cli::run()
}
