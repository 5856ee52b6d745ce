use anyhow::{Context, Result};
use ticketdesk_app::{ApiErrorKind, TicketApi};
use ticketdesk_core::{BatchAction, NewTag, NewTicket, TicketQuery};
use ticketdesk_e2e::TestServer;

#[tokio::test(flavor = "multi_thread")]
async fn batch_delete_over_http_removes_exactly_the_selection() -> Result<()> {
    let server = TestServer::start().await?;
    let http = server.http()?;
    for title in ["alpha", "beta", "gamma"] {
        http.create_ticket(&NewTicket::titled(title)).await?;
    }

    let mut board = server.board()?;
    board.load().await?;
    assert_eq!(board.visible().len(), 3);

    board.select_all();
    let keep = board.visible()[0].id;
    board.deselect(keep);
    let doomed = board.selection().to_vec();

    let outcome = board.apply_batch(BatchAction::Delete).await?;
    assert!(outcome.success);
    assert_eq!(outcome.affected_count, 2);
    assert!(board.selection().is_empty());

    let remaining = http.list_tickets(&TicketQuery::new()).await?;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, keep);
    assert!(doomed.iter().all(|id| remaining.iter().all(|t| t.id != *id)));

    server.stop().await
}

#[tokio::test(flavor = "multi_thread")]
async fn http_errors_carry_server_detail() -> Result<()> {
    let server = TestServer::start().await?;
    let http = server.http()?;
    http.create_tag(&NewTag::named("bug")).await?;

    let err = http
        .create_tag(&NewTag::named("Bug"))
        .await
        .err()
        .context("duplicate tag must fail")?;
    assert_eq!(err.kind, ApiErrorKind::Status(400));
    assert_eq!(err.title, "Bad Request");
    assert_eq!(err.message, "Tag 'Bug' already exists");

    let err = http.batch_delete(&[]).await.err().context("empty batch must fail")?;
    assert_eq!(err.message, "No ticket IDs provided");

    server.stop().await
}

#[tokio::test(flavor = "multi_thread")]
async fn search_input_settles_into_a_filtered_list() -> Result<()> {
    let server = TestServer::start().await?;
    let http = server.http()?;
    http.create_ticket(&NewTicket::titled("Login fails on Safari")).await?;
    http.create_ticket(&NewTicket::titled("Dark mode")).await?;

    let mut board = server.board()?;
    board.load().await?;
    board.input_search("safari");
    board.settle_search().await?;
    assert_eq!(board.visible().len(), 1);
    assert_eq!(board.visible()[0].title, "Login fails on Safari");

    server.stop().await
}
