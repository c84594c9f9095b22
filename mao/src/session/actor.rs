//! Game actor: the single owner of one [`Game`].

use tokio::sync::{mpsc, oneshot};

use super::messages::{GameMessage, Reply};
use crate::game::{
    Game, GameCode, GameError, GameResult, GameSnapshot, PlayerId, Proposal, Resolution,
};

/// Cloneable handle for sending messages to a game actor
#[derive(Clone, Debug)]
pub struct GameHandle {
    sender: mpsc::Sender<GameMessage>,
    code: GameCode,
}

impl GameHandle {
    pub fn code(&self) -> &GameCode {
        &self.code
    }

    /// Whether the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    pub async fn join(&self, player_id: PlayerId, name: String) -> GameResult<GameSnapshot> {
        self.request(|response| GameMessage::Join {
            player_id,
            name,
            response,
        })
        .await
    }

    pub async fn start(&self, requester: PlayerId) -> GameResult<GameSnapshot> {
        self.request(|response| GameMessage::Start {
            requester,
            response,
        })
        .await
    }

    pub async fn propose(&self, proposer: PlayerId, proposal: Proposal) -> GameResult<GameSnapshot> {
        self.request(|response| GameMessage::Propose {
            proposer,
            proposal,
            response,
        })
        .await
    }

    pub async fn accept(&self, voter: PlayerId) -> GameResult<GameSnapshot> {
        self.request(|response| GameMessage::Accept { voter, response })
            .await
    }

    pub async fn challenge(&self, voter: PlayerId) -> GameResult<GameSnapshot> {
        self.request(|response| GameMessage::Challenge { voter, response })
            .await
    }

    pub async fn resolve(
        &self,
        arbiter: PlayerId,
        resolution: Resolution,
        penalty_count: u32,
    ) -> GameResult<GameSnapshot> {
        self.request(|response| GameMessage::Resolve {
            arbiter,
            resolution,
            penalty_count,
            response,
        })
        .await
    }

    pub async fn penalize(
        &self,
        requester: PlayerId,
        target: PlayerId,
        count: u32,
    ) -> GameResult<GameSnapshot> {
        self.request(|response| GameMessage::Penalize {
            requester,
            target,
            count,
            response,
        })
        .await
    }

    pub async fn snapshot(&self) -> GameResult<GameSnapshot> {
        let (response, receiver) = oneshot::channel();
        self.send(GameMessage::GetSnapshot { response }).await?;
        receiver.await.map_err(|_| self.unavailable())
    }

    async fn request(&self, build: impl FnOnce(Reply) -> GameMessage) -> GameResult<GameSnapshot> {
        let (response, receiver) = oneshot::channel();
        self.send(build(response)).await?;
        receiver.await.map_err(|_| self.unavailable())?
    }

    async fn send(&self, message: GameMessage) -> GameResult<()> {
        self.sender
            .send(message)
            .await
            .map_err(|_| self.unavailable())
    }

    fn unavailable(&self) -> GameError {
        GameError::GameUnavailable(self.code.to_string())
    }
}

/// Actor task draining one game's inbox in arrival order.
pub struct GameActor {
    game: Game,
    inbox: mpsc::Receiver<GameMessage>,
}

impl GameActor {
    /// Create an actor for `game` together with its handle
    pub fn new(game: Game, inbox_capacity: usize) -> (Self, GameHandle) {
        let (sender, inbox) = mpsc::channel(inbox_capacity.max(1));
        let handle = GameHandle {
            sender,
            code: game.id().clone(),
        };
        (Self { game, inbox }, handle)
    }

    /// Spawn the actor on the current runtime and return its handle
    pub fn spawn(game: Game, inbox_capacity: usize) -> GameHandle {
        let (actor, handle) = Self::new(game, inbox_capacity);
        tokio::spawn(actor.run());
        handle
    }

    /// Run until every handle is dropped
    pub async fn run(mut self) {
        log::debug!("Game {} actor starting", self.game.id());

        while let Some(message) = self.inbox.recv().await {
            self.handle_message(message);
        }

        log::debug!("Game {} actor stopped", self.game.id());
    }

    fn handle_message(&mut self, message: GameMessage) {
        let label = message.label();
        let game = &mut self.game;

        let (result, response) = match message {
            GameMessage::Join {
                player_id,
                name,
                response,
            } => (game.join(player_id, &name), response),
            GameMessage::Start {
                requester,
                response,
            } => (game.start(&requester), response),
            GameMessage::Propose {
                proposer,
                proposal,
                response,
            } => (game.propose(&proposer, proposal).map(|_| ()), response),
            GameMessage::Accept { voter, response } => {
                (game.accept(&voter).map(|_| ()), response)
            }
            GameMessage::Challenge { voter, response } => {
                (game.challenge(&voter).map(|_| ()), response)
            }
            GameMessage::Resolve {
                arbiter,
                resolution,
                penalty_count,
                response,
            } => (game.resolve(&arbiter, resolution, penalty_count), response),
            GameMessage::Penalize {
                requester,
                target,
                count,
                response,
            } => (game.penalize(&requester, &target, count), response),
            GameMessage::GetSnapshot { response } => {
                let _ = response.send(game.snapshot());
                return;
            }
        };

        if let Err(ref e) = result {
            log::debug!("Game {}: {} rejected: {}", game.id(), label, e);
        }
        let _ = response.send(result.map(|()| game.snapshot()));
    }
}
