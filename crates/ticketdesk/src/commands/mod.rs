use anyhow::{Context, Result};
use ticketdesk_app::{Config, HttpTicketClient, QueryClient, TicketBoard};
use ticketdesk_core::{BatchAction, NewTag, NewTicket, TagId, TagUpdate, TicketId, TicketQuery, TicketUpdate};

use crate::{BatchVerb, Command, FilterArgs, LsFormat, SelectArgs, TagCommand};

mod render;

type Client = QueryClient<HttpTicketClient>;

pub async fn run(command: Command, config: &Config) -> Result<()> {
    let api = HttpTicketClient::from_config(&config.client).context("failed to build HTTP client")?;
    let mut client = QueryClient::new(api, &config.client);
    match command {
        Command::Serve => ticketdesk_server::serve(&config.server).await,
        Command::Ls { filter, format } => handle_ls(&mut client, &filter, format).await,
        Command::New {
            title,
            description,
            tags,
        } => {
            let new = NewTicket {
                title,
                description,
                tag_ids: tags.into_iter().map(TagId).collect(),
            };
            let ticket = client.create_ticket(&new).await?;
            println!("created ticket: {} ({})", ticket.id, ticket.title);
            Ok(())
        }
        Command::Show { id } => {
            let ticket = client.ticket(TicketId(id)).await?;
            println!("{}", serde_json::to_string_pretty(&ticket)?);
            Ok(())
        }
        Command::Edit {
            id,
            title,
            description,
            completed,
        } => {
            let update = TicketUpdate {
                title,
                description,
                is_completed: completed,
            };
            let ticket = client.update_ticket(TicketId(id), &update).await?;
            println!("updated ticket: {} ({})", ticket.id, ticket.title);
            Ok(())
        }
        Command::Rm { id } => {
            client.delete_ticket(TicketId(id)).await?;
            println!("deleted ticket: {id}");
            Ok(())
        }
        Command::Toggle { id } => {
            let ticket = client.toggle_ticket(TicketId(id)).await?;
            println!("ticket {} is now {}", ticket.id, render::status_label(ticket.is_completed));
            Ok(())
        }
        Command::TagAdd { id, tags } => {
            let tags: Vec<TagId> = tags.into_iter().map(TagId).collect();
            let ticket = client.add_tags(TicketId(id), &tags).await?;
            println!("ticket {} tags: {}", ticket.id, render::tag_names(&ticket));
            Ok(())
        }
        Command::TagRm { id, tag } => {
            let ticket = client.remove_tag(TicketId(id), TagId(tag)).await?;
            println!("ticket {} tags: {}", ticket.id, render::tag_names(&ticket));
            Ok(())
        }
        Command::Tag { cmd } => handle_tag(&mut client, cmd).await,
        Command::Batch {
            action,
            select,
            filter,
        } => handle_batch(client, config, action, &select, &filter).await,
    }
}

fn query_from(filter: &FilterArgs) -> TicketQuery {
    TicketQuery::new()
        .with_search(filter.search.clone())
        .with_tags(filter.tag_tokens())
        .with_status(filter.status)
}

async fn handle_ls(client: &mut Client, filter: &FilterArgs, format: LsFormat) -> Result<()> {
    let query = query_from(filter);
    let tickets = client.tickets(&query).await?;
    if tickets.is_empty() {
        if query.is_unfiltered() {
            println!("No tickets found");
        } else {
            println!("No tickets matched the provided filters");
        }
        return Ok(());
    }
    match format {
        LsFormat::Table => render::ticket_table(&tickets),
        LsFormat::Json => println!("{}", serde_json::to_string_pretty(&tickets)?),
    }
    Ok(())
}

async fn handle_tag(client: &mut Client, command: TagCommand) -> Result<()> {
    match command {
        TagCommand::Ls { search, format } => {
            let tags = client.tags(search.as_deref()).await?;
            if tags.is_empty() {
                println!("No tags found");
                return Ok(());
            }
            match format {
                LsFormat::Table => render::tag_table(&tags),
                LsFormat::Json => println!("{}", serde_json::to_string_pretty(&tags)?),
            }
        }
        TagCommand::New { name, color } => {
            let tag = client.create_tag(&NewTag { name, color }).await?;
            println!("created tag: {} ({})", tag.id, tag.name);
        }
        TagCommand::Edit { id, name, color } => {
            let tag = client
                .update_tag(TagId(id), &TagUpdate { name, color })
                .await?;
            println!("updated tag: {} ({})", tag.id, tag.name);
        }
        TagCommand::Rm { id } => {
            client.delete_tag(TagId(id)).await?;
            println!("deleted tag: {id}");
        }
    }
    Ok(())
}

const fn batch_action(verb: BatchVerb) -> BatchAction {
    match verb {
        BatchVerb::Complete => BatchAction::MarkComplete,
        BatchVerb::Reopen => BatchAction::MarkIncomplete,
        BatchVerb::Delete => BatchAction::Delete,
    }
}

fn apply_selection<A>(board: &mut TicketBoard<A>, select: &SelectArgs) -> Result<()> {
    if select.all {
        board.select_all();
    }
    if select.completed {
        board.select_completed();
    }
    if select.open {
        board.select_incomplete();
    }
    for id in &select.ids {
        board
            .select(TicketId(*id))
            .with_context(|| format!("cannot select ticket {id}"))?;
    }
    if select.invert {
        board.invert_selection();
    }
    Ok(())
}

async fn handle_batch(
    client: Client,
    config: &Config,
    verb: BatchVerb,
    select: &SelectArgs,
    filter: &FilterArgs,
) -> Result<()> {
    let mut board = TicketBoard::new(client, config.client.debounce());
    board.set_query(query_from(filter)).await?;
    apply_selection(&mut board, select)?;

    let action = batch_action(verb);
    let outcome = board.apply_batch(action).await?;
    println!("{}", outcome.message);
    Ok(())
}
