use anyhow::Result;

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::FetchArgs) -> Result<()> {
    let pipeline = super::pipeline(&args.config, &args.output, None)?;
    let results = pipeline.results(&args.election, args.force)?;

    println!("[fetch] {} districts of {} in {}",
        results.districts.len(), args.election, pipeline.cache().dir().display());

    Ok(())
}
