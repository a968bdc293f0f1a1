//! bucket commands - Create, list and delete buckets

use clap::{Args, Subcommand};
use comfy_table::{Table, presets};
use r2_core::{BucketInfo, BucketRef, Result};
use serde::Serialize;

use super::{BackendArgs, Context};
use crate::exit_code::ExitCode;
use crate::output::Formatter;

#[derive(Subcommand, Debug)]
pub enum BucketCommands {
    /// Create a new bucket
    Create(CreateArgs),

    /// List buckets
    List(ListArgs),

    /// Delete an empty bucket
    Delete(DeleteArgs),
}

/// Create a bucket
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Name of the bucket
    pub name: String,

    /// Jurisdiction the bucket is created in
    #[arg(short = 'J', long)]
    pub jurisdiction: Option<String>,

    #[command(flatten)]
    pub backend: BackendArgs,
}

/// List buckets
#[derive(Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub backend: BackendArgs,
}

/// Delete a bucket
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Name of the bucket
    pub name: String,

    /// Jurisdiction the bucket lives in
    #[arg(short = 'J', long)]
    pub jurisdiction: Option<String>,

    #[command(flatten)]
    pub backend: BackendArgs,
}

#[derive(Debug, Serialize)]
struct BucketOutput {
    status: &'static str,
    bucket: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    jurisdiction: Option<String>,
}

impl From<&BucketRef> for BucketOutput {
    fn from(bucket: &BucketRef) -> Self {
        Self {
            status: "success",
            bucket: bucket.name.clone(),
            jurisdiction: bucket.jurisdiction.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct BucketListOutput {
    buckets: Vec<BucketInfo>,
}

/// Execute a bucket subcommand
pub async fn execute(cmd: BucketCommands, ctx: &Context) -> ExitCode {
    let formatter = Formatter::new(ctx.output.clone());
    let result = match cmd {
        BucketCommands::Create(args) => create(args, ctx, &formatter).await,
        BucketCommands::List(args) => list(args, ctx, &formatter).await,
        BucketCommands::Delete(args) => delete(args, ctx, &formatter).await,
    };

    match result {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            formatter.error(&e.to_string());
            ExitCode::from(&e)
        }
    }
}

async fn create(args: CreateArgs, ctx: &Context, formatter: &Formatter) -> Result<()> {
    let bucket = BucketRef::new(args.name, args.jurisdiction)?;
    let store = ctx.open_store(&args.backend, formatter)?;

    formatter.status(&format!("Creating bucket {bucket}."));
    store.create_bucket(&bucket).await?;

    if formatter.is_json() {
        formatter.json(&BucketOutput::from(&bucket));
    } else {
        formatter.success(&format!("Created bucket {bucket}."));
    }
    Ok(())
}

async fn list(args: ListArgs, ctx: &Context, formatter: &Formatter) -> Result<()> {
    let store = ctx.open_store(&args.backend, formatter)?;
    let buckets = store.list_buckets().await?;

    if formatter.is_json() {
        formatter.json(&BucketListOutput { buckets });
        return Ok(());
    }

    if buckets.is_empty() {
        formatter.println("No buckets found.");
        return Ok(());
    }
    formatter.println(&bucket_table(&buckets).to_string());
    Ok(())
}

fn bucket_table(buckets: &[BucketInfo]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .set_header(vec!["Name", "Created"]);
    for bucket in buckets {
        table.add_row(vec![
            bucket.name.clone(),
            bucket.creation_date.clone().unwrap_or_default(),
        ]);
    }
    table
}

async fn delete(args: DeleteArgs, ctx: &Context, formatter: &Formatter) -> Result<()> {
    let bucket = BucketRef::new(args.name, args.jurisdiction)?;
    let store = ctx.open_store(&args.backend, formatter)?;

    formatter.status(&format!("Deleting bucket {bucket}."));
    store.delete_bucket(&bucket).await?;

    if formatter.is_json() {
        formatter.json(&BucketOutput::from(&bucket));
    } else {
        formatter.success(&format!("Deleted bucket {bucket}."));
    }
    Ok(())
}
