use anyhow::{Context, Result};
use board_core::{
    draft::{CardDraft, DUE_DATE_FORMAT},
    HttpRemoteDataGateway, ImageUpload, RemoteDataGateway,
};
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use shared::{
    domain::{ColumnId, DashboardId, UserId},
    protocol::AssigneeSummary,
};

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long)]
    server_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a card directly through the HTTP gateway.
    CreateCard {
        #[arg(long)]
        dashboard_id: i64,
        #[arg(long)]
        column_id: i64,
        #[arg(long)]
        assignee_user_id: i64,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        /// Due date in "yyyy-MM-dd HH:mm" form.
        #[arg(long)]
        due_date: Option<String>,
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long)]
        image_url: Option<String>,
    },
    /// Upload a local image for a column and print the hosted URL.
    UploadImage {
        #[arg(long)]
        column_id: i64,
        #[arg(long)]
        mime_type: Option<String>,
        path: std::path::PathBuf,
    },
    /// Print the stand-in assignee roster the card form offers.
    ListAssignees,
}

fn stand_in_roster() -> Vec<AssigneeSummary> {
    vec![
        AssigneeSummary {
            user_id: UserId(3222),
            name: "yu.seungwan".to_string(),
        },
        AssigneeSummary {
            user_id: UserId(3223),
            name: "hong.gildong".to_string(),
        },
        AssigneeSummary {
            user_id: UserId(3224),
            name: "kim.cheolsu".to_string(),
        },
    ]
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let cli = Cli::parse();
    let gateway = HttpRemoteDataGateway::new(cli.server_url);

    match cli.command {
        Command::CreateCard {
            dashboard_id,
            column_id,
            assignee_user_id,
            title,
            description,
            due_date,
            tags,
            image_url,
        } => {
            let due_date = due_date
                .map(|raw| {
                    NaiveDateTime::parse_from_str(&raw, DUE_DATE_FORMAT)
                        .with_context(|| format!("invalid due date '{raw}'"))
                })
                .transpose()?;
            let draft = CardDraft {
                assignee_user_id: Some(UserId(assignee_user_id)),
                title,
                description,
                due_date,
                image_url: image_url.unwrap_or_default(),
            };
            draft.validate()?;
            let request =
                draft.to_create_request(DashboardId(dashboard_id), ColumnId(column_id), tags);
            let card = gateway.create_card(request).await?;
            println!("{}", serde_json::to_string_pretty(&card)?);
        }
        Command::UploadImage {
            column_id,
            mime_type,
            path,
        } => {
            let bytes = std::fs::read(&path)
                .with_context(|| format!("failed to read image at {}", path.display()))?;
            let filename = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "image".to_string());
            let response = gateway
                .upload_card_image(
                    ColumnId(column_id),
                    ImageUpload {
                        filename,
                        mime_type,
                        bytes,
                    },
                )
                .await?;
            println!("uploaded imageUrl={}", response.image_url);
        }
        Command::ListAssignees => {
            println!("{}", serde_json::to_string_pretty(&stand_in_roster())?);
        }
    }

    Ok(())
}
