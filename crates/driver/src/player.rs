//! The `player` module contains the [GamePlayer] state machine that drives a single dispute game.

use crate::{
    responder::{resolve_tx, response_tx},
    GameContract, GameMetadata, PlayerStatus, TxSubmitter, ValidationError, Validator,
};
use anyhow::Result;
use balin_fault::{FaultDisputeState, FaultSolverResponse};
use balin_primitives::{DisputeSolver, GameStatus};
use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

/// A [GamePlayer] acts on a single dispute game. Each call to [GamePlayer::progress] performs one decision cycle
/// against the latest on-chain state.
#[async_trait::async_trait]
pub trait GamePlayer: Send {
    /// Runs one decision cycle and returns the resulting status. Terminal players return their status unchanged.
    async fn progress(&mut self) -> PlayerStatus;

    /// Returns the status reached by the last decision cycle.
    fn status(&self) -> PlayerStatus;
}

/// The boxed solver a [FaultGamePlayer] asks for moves.
pub type BoxedFaultSolver =
    Box<dyn DisputeSolver<FaultDisputeState, FaultSolverResponse> + Send + Sync>;

/// The [FaultGamePlayer] plays a FaultDisputeGame. It validates the game once, then answers every claim that the
/// solver disagrees with until the game is settled.
pub struct FaultGamePlayer {
    game: GameMetadata,
    contract: Arc<dyn GameContract>,
    submitter: Arc<dyn TxSubmitter>,
    solver: BoxedFaultSolver,
    validators: Vec<Box<dyn Validator>>,
    split_depth: u8,
    max_depth: u8,
    max_clock_duration: u64,
    status: PlayerStatus,
    consecutive_failures: u32,
    max_consecutive_failures: Option<u32>,
}

impl FaultGamePlayer {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        game: GameMetadata,
        contract: Arc<dyn GameContract>,
        submitter: Arc<dyn TxSubmitter>,
        solver: BoxedFaultSolver,
        validators: Vec<Box<dyn Validator>>,
        split_depth: u8,
        max_depth: u8,
        max_clock_duration: u64,
        max_consecutive_failures: Option<u32>,
    ) -> Self {
        Self {
            game,
            contract,
            submitter,
            solver,
            validators,
            split_depth,
            max_depth,
            max_clock_duration,
            status: PlayerStatus::Created,
            consecutive_failures: 0,
            max_consecutive_failures,
        }
    }

    async fn tick(&mut self) -> Result<PlayerStatus> {
        let status = self.contract.status().await?;
        if status.is_resolved() {
            return Ok(PlayerStatus::Resolved(status));
        }

        if matches!(self.status, PlayerStatus::Created | PlayerStatus::Validating) {
            self.status = PlayerStatus::Validating;
            for validator in self.validators.iter() {
                validator.validate().await?;
            }
            tracing::info!(target: "game-player", "Validated game {} ({})", self.game.address, self.game.game_type);
            self.status = PlayerStatus::Progressing;
        }

        let claims = self.contract.claims().await?;
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
        let state =
            FaultDisputeState::try_from_claims(claims, status, self.split_depth, self.max_depth)?
                .with_clock(now, self.max_clock_duration);
        let responses = self.solver.available_moves(&state).await?;

        // Moves go out one at a time; the next is not sent until the previous one has a receipt.
        let mut submitted = 0;
        let mut failure = None;
        for response in responses.iter() {
            let Some(tx) = response_tx(self.game.address, response) else {
                continue;
            };
            match self.submitter.submit(tx).await {
                Ok(receipt) => {
                    tracing::info!(target: "game-player", "Played {:?} in game {} ({}), tx {}", response, self.game.address, self.game.game_type, receipt.tx_hash);
                    submitted += 1;
                }
                Err(e) => {
                    failure = Some(e.context(format!("Failed to play {response:?}")));
                    break;
                }
            }
        }

        // A game whose moves all failed may still be resolvable.
        if submitted == 0 {
            if let Some(status) = self.try_resolve().await? {
                return Ok(PlayerStatus::Resolved(status));
            }
        }
        match failure {
            Some(e) => Err(e),
            None => Ok(PlayerStatus::Progressing),
        }
    }

    /// Resolves the game if a simulated `resolve()` settles it.
    async fn try_resolve(&self) -> Result<Option<GameStatus>> {
        let status = match self.contract.call_resolve().await {
            Ok(status) if status.is_resolved() => status,
            Ok(_) => return Ok(None),
            Err(e) => {
                tracing::trace!(target: "game-player", "Game {} can not be resolved yet: {}", self.game.address, e);
                return Ok(None);
            }
        };

        self.submitter.submit(resolve_tx(self.game.address)).await?;
        tracing::info!(target: "game-player", "Resolved game {} ({}): {}", self.game.address, self.game.game_type, status);
        Ok(Some(status))
    }
}

#[async_trait::async_trait]
impl GamePlayer for FaultGamePlayer {
    async fn progress(&mut self) -> PlayerStatus {
        if self.status.is_terminal() {
            return self.status;
        }

        match self.tick().await {
            Ok(status) => {
                self.consecutive_failures = 0;
                self.status = status;
            }
            Err(e) if e.downcast_ref::<ValidationError>().is_some() => {
                tracing::error!(target: "game-player", "Game {} ({}) failed validation: {}", self.game.address, self.game.game_type, e);
                self.status = PlayerStatus::Failed;
            }
            Err(e) => {
                self.consecutive_failures += 1;
                tracing::warn!(target: "game-player", "Tick {} for game {} ({}) failed: {:#}", self.consecutive_failures, self.game.address, self.game.game_type, e);

                if self
                    .max_consecutive_failures
                    .is_some_and(|max| self.consecutive_failures >= max)
                {
                    tracing::error!(target: "game-player", "Giving up on game {} ({}) after {} consecutive failures", self.game.address, self.game.game_type, self.consecutive_failures);
                    self.status = PlayerStatus::Failed;
                }
            }
        }
        self.status
    }

    fn status(&self) -> PlayerStatus {
        self.status
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::{FakeGameContract, RecordingSubmitter, GAME};
    use balin_primitives::{Claim, GameType};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers every game with a fixed set of responses.
    struct FixedSolver(Vec<FaultSolverResponse>);

    #[async_trait::async_trait]
    impl DisputeSolver<FaultDisputeState, FaultSolverResponse> for FixedSolver {
        async fn available_moves(
            &self,
            _: &FaultDisputeState,
        ) -> Result<Arc<[FaultSolverResponse]>> {
            Ok(self.0.clone().into())
        }
    }

    struct FailingValidator;

    #[async_trait::async_trait]
    impl Validator for FailingValidator {
        async fn validate(&self) -> Result<()> {
            Err(ValidationError::PrestateMismatch {
                kind: "absolute prestate",
                onchain: Claim::ZERO,
                local: Claim::repeat_byte(1),
            }
            .into())
        }
    }

    #[derive(Default)]
    struct CountingValidator(Arc<AtomicUsize>);

    #[async_trait::async_trait]
    impl Validator for CountingValidator {
        async fn validate(&self) -> Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn setup() -> (Arc<FakeGameContract>, Arc<RecordingSubmitter>) {
        let contract = Arc::new(FakeGameContract::default());
        contract.push_claim(u32::MAX, Claim::repeat_byte(0xFF), 1);
        (contract, Arc::new(RecordingSubmitter::default()))
    }

    fn player(
        contract: &Arc<FakeGameContract>,
        submitter: &Arc<RecordingSubmitter>,
        responses: Vec<FaultSolverResponse>,
        validators: Vec<Box<dyn Validator>>,
        max_consecutive_failures: Option<u32>,
    ) -> FaultGamePlayer {
        FaultGamePlayer::new(
            GameMetadata {
                address: GAME,
                game_type: GameType::ALPHABET,
                timestamp: 0,
            },
            contract.clone(),
            submitter.clone(),
            Box::new(FixedSolver(responses)),
            validators,
            2,
            4,
            u64::MAX,
            max_consecutive_failures,
        )
    }

    #[tokio::test]
    async fn failed_validation_submits_nothing() {
        let (contract, submitter) = setup();
        let mut player = player(
            &contract,
            &submitter,
            vec![FaultSolverResponse::Move(true, 0, Claim::ZERO)],
            vec![Box::new(FailingValidator)],
            None,
        );

        assert_eq!(player.progress().await, PlayerStatus::Failed);
        assert_eq!(player.progress().await, PlayerStatus::Failed);
        assert!(submitter.submitted().is_empty());
    }

    #[tokio::test]
    async fn validates_once_then_plays() {
        let (contract, submitter) = setup();
        let validations = Arc::new(AtomicUsize::new(0));
        let mut player = player(
            &contract,
            &submitter,
            vec![
                FaultSolverResponse::Skip(0),
                FaultSolverResponse::Move(true, 0, Claim::repeat_byte(2)),
            ],
            vec![Box::new(CountingValidator(validations.clone()))],
            None,
        );
        assert_eq!(player.status(), PlayerStatus::Created);

        assert_eq!(player.progress().await, PlayerStatus::Progressing);
        assert_eq!(player.progress().await, PlayerStatus::Progressing);
        assert_eq!(validations.load(Ordering::SeqCst), 1);

        let submitted = submitter.submitted();
        assert_eq!(submitted.len(), 2);
        assert_eq!(
            submitted[0],
            response_tx(GAME, &FaultSolverResponse::Move(true, 0, Claim::repeat_byte(2))).unwrap()
        );
    }

    #[tokio::test]
    async fn transient_validation_errors_are_retried() {
        let (contract, submitter) = setup();
        contract.fail_reads(true);
        let validations = Arc::new(AtomicUsize::new(0));
        let mut player = player(
            &contract,
            &submitter,
            vec![],
            vec![Box::new(CountingValidator(validations.clone()))],
            None,
        );

        assert_eq!(player.progress().await, PlayerStatus::Created);
        assert_eq!(validations.load(Ordering::SeqCst), 0);
        contract.fail_reads(false);
        assert_eq!(player.progress().await, PlayerStatus::Progressing);
        assert_eq!(validations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn settled_games_resolve() {
        let (contract, submitter) = setup();
        contract.set_status(GameStatus::DefenderWins);
        let mut player = player(&contract, &submitter, vec![], vec![], None);

        assert_eq!(
            player.progress().await,
            PlayerStatus::Resolved(GameStatus::DefenderWins)
        );
        assert!(player.status().is_terminal());
        assert!(submitter.submitted().is_empty());
    }

    #[tokio::test]
    async fn resolves_when_there_is_nothing_to_play() {
        let (contract, submitter) = setup();
        let mut player = player(
            &contract,
            &submitter,
            vec![FaultSolverResponse::Skip(0)],
            vec![],
            None,
        );

        // The clocks are still running.
        assert_eq!(player.progress().await, PlayerStatus::Progressing);
        contract.set_resolve_status(Some(GameStatus::InProgress));
        assert_eq!(player.progress().await, PlayerStatus::Progressing);
        assert!(submitter.submitted().is_empty());

        contract.set_resolve_status(Some(GameStatus::ChallengerWins));
        assert_eq!(
            player.progress().await,
            PlayerStatus::Resolved(GameStatus::ChallengerWins)
        );
        assert_eq!(submitter.submitted(), vec![resolve_tx(GAME)]);
    }

    #[tokio::test]
    async fn resolves_when_every_move_reverts() {
        let (contract, submitter) = setup();
        submitter.revert_moves(true);
        let mut player = player(
            &contract,
            &submitter,
            vec![FaultSolverResponse::Move(true, 0, Claim::repeat_byte(2))],
            vec![],
            None,
        );

        // The move reverts and the clocks are still running.
        assert_eq!(player.progress().await, PlayerStatus::Progressing);
        assert!(submitter.submitted().is_empty());

        contract.set_resolve_status(Some(GameStatus::ChallengerWins));
        assert_eq!(
            player.progress().await,
            PlayerStatus::Resolved(GameStatus::ChallengerWins)
        );
        assert_eq!(submitter.submitted(), vec![resolve_tx(GAME)]);
    }

    #[tokio::test]
    async fn gives_up_after_consecutive_failures() {
        let (contract, submitter) = setup();
        submitter.fail(true);
        let mut player = player(
            &contract,
            &submitter,
            vec![FaultSolverResponse::Move(true, 0, Claim::ZERO)],
            vec![],
            Some(3),
        );

        assert_eq!(player.progress().await, PlayerStatus::Progressing);
        assert_eq!(player.progress().await, PlayerStatus::Progressing);

        // A successful tick resets the count.
        submitter.fail(false);
        assert_eq!(player.progress().await, PlayerStatus::Progressing);
        submitter.fail(true);
        assert_eq!(player.progress().await, PlayerStatus::Progressing);
        assert_eq!(player.progress().await, PlayerStatus::Progressing);
        assert_eq!(player.progress().await, PlayerStatus::Failed);
    }

    #[tokio::test]
    async fn malformed_claims_are_transient() {
        let contract = Arc::new(FakeGameContract::default());
        contract.push_claim(0, Claim::ZERO, 2);
        let submitter = Arc::new(RecordingSubmitter::default());
        let mut player = player(&contract, &submitter, vec![], vec![], None);

        assert_eq!(player.progress().await, PlayerStatus::Progressing);
        assert!(submitter.submitted().is_empty());
    }
}
