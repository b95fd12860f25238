use anyhow::Result;

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::CompareArgs) -> Result<()> {
    let mut pipeline = super::pipeline(&args.config, &args.output, None)?;
    let overlaps = pipeline.compare(&args.source, args.force)?;

    let unmatched = overlaps.iter().filter(|(_, entries)| entries.is_empty()).count();
    println!("[compare] {} target districts compared with {}, {} without overlap",
        overlaps.len(), args.source, unmatched);

    Ok(())
}
