//! `regsweep sweep` command — find and act on stale tags.

use clap::Args;

use regsweep_core::policy::RetentionPolicy;
use regsweep_registry::sweep::Sweeper;

use super::ConnectionArgs;

#[derive(Args)]
pub struct SweepArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Age threshold in days; tags strictly older become deletion
    /// candidates. Negative lists every tag without selecting any.
    #[arg(short, long, default_value_t = -1, allow_negative_numbers = true)]
    pub days: i64,

    /// Never delete tags whose "repository:tag" name matches this regex
    #[arg(long, value_name = "REGEX")]
    pub keep: Option<String>,

    /// Only delete tags whose "repository:tag" name matches this regex
    #[arg(long, value_name = "REGEX")]
    pub remove: Option<String>,

    /// Perform the deletions instead of the default dry run
    #[arg(short, long)]
    pub force: bool,
}

pub async fn execute(args: SweepArgs) -> Result<(), Box<dyn std::error::Error>> {
    let policy = build_policy(&args)?;
    let report_only = policy.is_report_only();
    let dry_run = policy.dry_run();

    let client = args.connection.client()?;
    let report = Sweeper::new(client, policy).run().await?;

    println!(
        "Swept {} repositories, {} tags ({} skipped).",
        report.repositories, report.tags, report.skipped
    );

    if report_only {
        println!("{} tags listed.", report.reported());
    } else if dry_run {
        println!(
            "{} tags would be deleted. Use --force to perform the deletions.",
            report.simulated()
        );
    } else {
        println!(
            "{} tags deleted, {} failed, {} kept.",
            report.deleted(),
            report.failed(),
            report.kept
        );
    }

    Ok(())
}

/// Translate the flags into a retention policy.
fn build_policy(args: &SweepArgs) -> Result<RetentionPolicy, Box<dyn std::error::Error>> {
    let mut policy = if args.days < 0 {
        RetentionPolicy::report_only()
    } else {
        let days = u32::try_from(args.days)
            .map_err(|_| format!("day threshold out of range: {}", args.days))?;
        RetentionPolicy::max_age_days(days).with_dry_run(!args.force)
    };

    if let Some(pattern) = &args.keep {
        policy = policy.with_keep_pattern(pattern)?;
    }
    if let Some(pattern) = &args.remove {
        policy = policy.with_remove_pattern(pattern)?;
    }

    Ok(policy)
}
