//! Integration tests for full game flows driven through the command service.
//!
//! Each test plays one or more connections against a shared service and
//! checks both the returned snapshots and the views pushed to outboxes.

use mao::{
    Card, Command, Connection, ErrorKind, GameCommand, GameConfig, GameRegistry, GameService,
    GameSnapshot, GameStatus, PlayerId, PlayerView, Proposal, Rank, Resolution,
    SessionDirectory, Suit,
};
use tokio::sync::mpsc;

struct Seat {
    connection: Connection,
    outbox: mpsc::Receiver<PlayerView>,
}

impl Seat {
    fn new() -> Self {
        let (connection, outbox) = Connection::new(64);
        Self { connection, outbox }
    }

    /// Drain the outbox and return the newest view.
    fn latest_view(&mut self) -> Option<PlayerView> {
        let mut latest = None;
        while let Ok(view) = self.outbox.try_recv() {
            latest = Some(view);
        }
        latest
    }
}

fn id(name: &str) -> PlayerId {
    PlayerId::new(name).unwrap()
}

fn service_with(config: GameConfig) -> GameService {
    GameService::new(GameRegistry::new(config), SessionDirectory::new())
}

async fn run(service: &GameService, seat: &Seat, command: impl Into<Command>) -> GameSnapshot {
    service
        .execute(&seat.connection, command.into(), None)
        .await
        .unwrap()
}

async fn run_err(service: &GameService, seat: &Seat, command: impl Into<Command>) -> ErrorKind {
    service
        .execute(&seat.connection, command.into(), None)
        .await
        .unwrap_err()
        .kind()
}

/// Create a game with alice as admin plus the given players, all seated.
async fn setup(service: &GameService, others: &[&str]) -> (Seat, Vec<Seat>, String) {
    let admin = Seat::new();
    let snapshot = run(
        service,
        &admin,
        Command::CreateGame {
            admin_name: "alice".to_string(),
        },
    )
    .await;
    let code = snapshot.id.to_string();

    let mut seats = Vec::new();
    for name in others {
        let seat = Seat::new();
        run(
            service,
            &seat,
            Command::JoinGame {
                game_id: code.clone(),
                name: name.to_string(),
            },
        )
        .await;
        seats.push(seat);
    }
    (admin, seats, code)
}

fn hand_of(snapshot: &GameSnapshot, name: &str) -> Vec<Card> {
    snapshot.player(&id(name)).unwrap().hand.clone()
}

fn card_not_in(hand: &[Card]) -> Card {
    Rank::ALL
        .into_iter()
        .flat_map(|rank| Suit::ALL.into_iter().map(move |suit| Card::new(rank, suit)))
        .find(|card| !hand.contains(card))
        .unwrap()
}

#[tokio::test]
async fn test_bluffed_play_is_caught_on_resolve() {
    let service = service_with(GameConfig::default());
    let (admin, seats, _code) = setup(&service, &["bob"]).await;
    let bob = &seats[0];

    assert_eq!(
        run_err(&service, bob, GameCommand::Start).await,
        ErrorKind::Forbidden
    );
    let started = run(&service, &admin, GameCommand::Start).await;
    assert_eq!(started.status, GameStatus::Active);
    assert_eq!(hand_of(&started, "alice").len(), 7);
    assert_eq!(hand_of(&started, "bob").len(), 7);

    let bluff = card_not_in(&hand_of(&started, "alice"));
    run(
        &service,
        &admin,
        GameCommand::Propose {
            proposal: Proposal::PlayCard(bluff),
        },
    )
    .await;
    let before = run(&service, bob, GameCommand::Challenge).await;

    let kind = run_err(
        &service,
        &admin,
        GameCommand::Resolve {
            resolution: Resolution::Accept,
            penalty_count: 0,
        },
    )
    .await;
    assert_eq!(kind, ErrorKind::NotFound);

    let after = service.registry().snapshot(before.id.as_str()).await.unwrap();
    assert_eq!(after, before);
    let pending = after.current_action.unwrap();
    assert!(!pending.is_resolved());
    assert!(pending.votes().challenged_by().contains(&id("bob")));
}

#[tokio::test]
async fn test_accepted_draw() {
    let service = service_with(GameConfig::default());
    let (admin, mut seats, _code) = setup(&service, &["bob"]).await;

    run(&service, &admin, GameCommand::Start).await;
    run(
        &service,
        &seats[0],
        GameCommand::Propose {
            proposal: Proposal::Draw,
        },
    )
    .await;
    run(&service, &admin, GameCommand::Accept).await;
    let resolved = run(
        &service,
        &admin,
        GameCommand::Resolve {
            resolution: Resolution::Accept,
            penalty_count: 5,
        },
    )
    .await;

    assert_eq!(hand_of(&resolved, "bob").len(), 8);
    assert_eq!(hand_of(&resolved, "alice").len(), 7);
    assert!(resolved.current_action.is_none());
    assert_eq!(resolved.last_action.as_ref().unwrap().proposer_id, id("bob"));

    let view = seats[0].latest_view().unwrap();
    assert_eq!(view.hand.len(), 8);
    assert_eq!(view.version, resolved.version);
    assert_eq!(view.last_action.unwrap().player_id, id("bob"));
}

#[tokio::test]
async fn test_each_resolution_branch() {
    let service = service_with(GameConfig::default());
    let (admin, seats, _code) = setup(&service, &["bob", "carol"]).await;
    let (bob, carol) = (&seats[0], &seats[1]);
    let started = run(&service, &admin, GameCommand::Start).await;

    // ACCEPT: card leaves bob's hand, carol pays for her challenge
    let card = hand_of(&started, "bob")[0];
    run(
        &service,
        bob,
        GameCommand::Propose {
            proposal: Proposal::PlayCard(card),
        },
    )
    .await;
    run(&service, carol, GameCommand::Challenge).await;
    let accepted = run(
        &service,
        &admin,
        GameCommand::Resolve {
            resolution: Resolution::Accept,
            penalty_count: 4,
        },
    )
    .await;
    assert_eq!(accepted.top_card, Some(card));
    assert_eq!(hand_of(&accepted, "bob").len(), 6);
    assert_eq!(hand_of(&accepted, "carol").len(), 8);

    // ACCEPT_WITH_PENALTY: card still leaves the hand, proposer pays
    let card = hand_of(&accepted, "carol")[0];
    run(
        &service,
        carol,
        GameCommand::Propose {
            proposal: Proposal::PlayCard(card),
        },
    )
    .await;
    let penalized = run(
        &service,
        &admin,
        GameCommand::Resolve {
            resolution: Resolution::AcceptWithPenalty,
            penalty_count: 2,
        },
    )
    .await;
    assert_eq!(penalized.top_card, Some(card));
    assert_eq!(hand_of(&penalized, "carol").len(), 9);

    // REJECT: nothing moves, proposer pays
    let card = hand_of(&penalized, "bob")[0];
    run(
        &service,
        bob,
        GameCommand::Propose {
            proposal: Proposal::PlayCard(card),
        },
    )
    .await;
    let rejected = run(
        &service,
        &admin,
        GameCommand::Resolve {
            resolution: Resolution::Reject,
            penalty_count: 3,
        },
    )
    .await;
    assert_eq!(rejected.top_card, penalized.top_card);
    assert_eq!(hand_of(&rejected, "bob").len(), 9);
    assert!(hand_of(&rejected, "bob").contains(&card));
    assert_eq!(
        rejected.last_action.as_ref().map(|a| a.proposer_id.clone()),
        Some(id("carol"))
    );
}

#[tokio::test]
async fn test_game_ends_when_a_hand_empties() {
    let service = service_with(GameConfig {
        starting_hand_size: 1,
        ..GameConfig::default()
    });
    let (admin, mut seats, _code) = setup(&service, &["bob"]).await;
    let started = run(&service, &admin, GameCommand::Start).await;

    let card = hand_of(&started, "bob")[0];
    run(
        &service,
        &seats[0],
        GameCommand::Propose {
            proposal: Proposal::PlayCard(card),
        },
    )
    .await;
    let ended = run(
        &service,
        &admin,
        GameCommand::Resolve {
            resolution: Resolution::Accept,
            penalty_count: 0,
        },
    )
    .await;

    assert_eq!(ended.status, GameStatus::Ended);
    assert_eq!(ended.winner_id, Some(id("bob")));
    let view = seats[0].latest_view().unwrap();
    assert_eq!(view.status, GameStatus::Ended);
    assert_eq!(view.winner_id, Some(id("bob")));

    let kind = run_err(
        &service,
        &admin,
        GameCommand::Propose {
            proposal: Proposal::Draw,
        },
    )
    .await;
    assert_eq!(kind, ErrorKind::InvalidState);
}

#[tokio::test]
async fn test_admin_penalty_command() {
    let service = service_with(GameConfig::default());
    let (admin, seats, _code) = setup(&service, &["bob"]).await;
    let bob = &seats[0];

    let kind = run_err(
        &service,
        &admin,
        GameCommand::Penalize {
            target: id("bob"),
            count: 2,
        },
    )
    .await;
    assert_eq!(kind, ErrorKind::InvalidState);

    run(&service, &admin, GameCommand::Start).await;
    let kind = run_err(
        &service,
        bob,
        GameCommand::Penalize {
            target: id("alice"),
            count: 2,
        },
    )
    .await;
    assert_eq!(kind, ErrorKind::Forbidden);

    let snapshot = run(
        &service,
        &admin,
        GameCommand::Penalize {
            target: id("bob"),
            count: 2,
        },
    )
    .await;
    assert_eq!(hand_of(&snapshot, "bob").len(), 9);

    let kind = run_err(
        &service,
        &admin,
        GameCommand::Penalize {
            target: id("nobody"),
            count: 1,
        },
    )
    .await;
    assert_eq!(kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_huge_penalty_is_rejected_without_dealing() {
    let service = service_with(GameConfig {
        max_penalty: 5,
        ..GameConfig::default()
    });
    let (admin, seats, code) = setup(&service, &["bob"]).await;
    run(&service, &admin, GameCommand::Start).await;

    let kind = run_err(
        &service,
        &admin,
        GameCommand::Penalize {
            target: id("bob"),
            count: 50_000_000,
        },
    )
    .await;
    assert_eq!(kind, ErrorKind::InvalidInput);

    run(&service, &seats[0], GameCommand::Propose { proposal: Proposal::Draw }).await;
    let kind = run_err(
        &service,
        &admin,
        GameCommand::Resolve {
            resolution: Resolution::Reject,
            penalty_count: 6,
        },
    )
    .await;
    assert_eq!(kind, ErrorKind::InvalidInput);

    let snapshot = service.registry().snapshot(&code).await.unwrap();
    assert_eq!(hand_of(&snapshot, "bob").len(), 7);
    assert!(snapshot.current_action.is_some());

    // Exactly at the limit is allowed.
    let snapshot = run(
        &service,
        &admin,
        GameCommand::Resolve {
            resolution: Resolution::Reject,
            penalty_count: 5,
        },
    )
    .await;
    assert_eq!(hand_of(&snapshot, "bob").len(), 12);
}

#[tokio::test]
async fn test_late_join_and_duplicate_join() {
    let service = service_with(GameConfig::default());
    let (admin, _seats, code) = setup(&service, &["bob"]).await;

    let twin = Seat::new();
    let kind = run_err(
        &service,
        &twin,
        Command::JoinGame {
            game_id: code.clone(),
            name: "bob".to_string(),
        },
    )
    .await;
    assert_eq!(kind, ErrorKind::Conflict);
    assert!(service.directory().binding(twin.connection.id).await.is_none());

    run(&service, &admin, GameCommand::Start).await;
    let late = Seat::new();
    let kind = run_err(
        &service,
        &late,
        Command::JoinGame {
            game_id: code,
            name: "dave".to_string(),
        },
    )
    .await;
    assert_eq!(kind, ErrorKind::InvalidState);
}

#[tokio::test]
async fn test_views_reach_only_the_bound_game() {
    let service = service_with(GameConfig::default());
    let (mut admin_one, _, _) = setup(&service, &["bob"]).await;
    let (admin_two, _, _) = setup(&service, &["carol"]).await;
    admin_one.latest_view();

    run(&service, &admin_two, GameCommand::Start).await;
    assert!(admin_one.latest_view().is_none());
}
