use time::format_description::well_known::Rfc3339;
use ticketdesk_core::{TagWithCount, Ticket};

pub const fn status_label(is_completed: bool) -> &'static str {
    if is_completed { "completed" } else { "open" }
}

pub fn tag_names(ticket: &Ticket) -> String {
    if ticket.tags.is_empty() {
        "-".to_owned()
    } else {
        ticket
            .tags
            .iter()
            .map(|tag| tag.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

pub fn ticket_table(tickets: &[Ticket]) {
    println!("ID | Status | Title | Tags | Updated");
    println!("-- | ------ | ----- | ---- | -------");
    for ticket in tickets {
        let updated = ticket
            .updated_at
            .format(&Rfc3339)
            .unwrap_or_else(|_| "-".to_owned());
        println!(
            "{} | {} | {} | {} | {}",
            ticket.id,
            status_label(ticket.is_completed),
            ticket.title,
            tag_names(ticket),
            updated
        );
    }
}

pub fn tag_table(tags: &[TagWithCount]) {
    println!("ID | Name | Color | Tickets");
    println!("-- | ---- | ----- | -------");
    for tag in tags {
        println!(
            "{} | {} | {} | {}",
            tag.id,
            tag.name,
            tag.color.as_deref().unwrap_or("-"),
            tag.ticket_count
        );
    }
}
