use anyhow::Result;

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::RunArgs) -> Result<()> {
    let mut pipeline = super::pipeline(&args.config, &args.output, args.results.as_deref())?;
    let summary = pipeline.run(args.force)?;

    println!("[run] combined {} elections into {} districts of {}",
        pipeline.config().elections.len(), summary.districts.len(), pipeline.config().target);
    println!("[run] wrote {}", pipeline.table_path().display());
    println!("[run] wrote {}", pipeline.geojson_path().display());

    Ok(())
}
