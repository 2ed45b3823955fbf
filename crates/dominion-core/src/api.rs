//! Query and submission facade over a running node.
//!
//! Reads take the game lock briefly and return owned views. Submissions
//! run one at a time. Each is dry-run against a snapshot of the game with
//! every earlier local submission that has not been applied yet replayed
//! on top, so a batch of intents cannot jointly overrun a world limit that
//! each would pass alone.

use std::collections::BTreeMap;
use std::sync::Arc;

use dominion_chain::{BacklogError, LocalEventBacklog};
use dominion_types::{BlockTimestamp, CreatePlanet, CreatePlayer, Event, EventBody, EventId};
use dominion_world::{
    Area, AreaPosition, AreaTile, AreaTilesExtent, Entity, Planet, Possession, Seed, State,
    WorldError,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::game::{EventOutcome, Game, GameError};

/// Errors returned by [`GameApi`].
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The event would not apply to the current world.
    #[error("event rejected: {source}")]
    Game {
        /// The game's reason.
        #[from]
        source: GameError,
    },

    /// A world query failed.
    #[error("query failed: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// The local backlog refused the event.
    #[error("submission failed: {source}")]
    Backlog {
        /// The underlying backlog error.
        #[from]
        source: BacklogError,
    },

    /// The dry run did not complete.
    #[error("dry run aborted: {reason}")]
    Task {
        /// Why the worker stopped.
        reason: String,
    },
}

/// A planet with its surface dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanetView {
    /// Planet entity.
    pub entity: Entity,
    /// Name and seed.
    pub planet: Planet,
    /// Surface dimensions.
    pub area: Area,
}

/// A seed with where it lies and who owns it.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedView {
    /// Seed entity.
    pub entity: Entity,
    /// Growth state.
    pub seed: Seed,
    /// Where it lies, if placed.
    pub position: Option<AreaPosition>,
    /// Its owner, if any.
    pub possession: Option<Possession>,
}

/// Read access to the game and write access to the local event backlog.
#[derive(Debug, Clone)]
pub struct GameApi {
    game: Arc<Mutex<Game>>,
    local_events: Arc<LocalEventBacklog>,
    submissions: Arc<Mutex<()>>,
}

impl GameApi {
    /// Facade over `game`, submitting through `local_events`.
    pub fn new(game: Arc<Mutex<Game>>, local_events: Arc<LocalEventBacklog>) -> Self {
        Self {
            game,
            local_events,
            submissions: Arc::new(Mutex::new(())),
        }
    }

    /// One planet.
    pub async fn planet(&self, entity: Entity) -> Result<PlanetView, ApiError> {
        planet_view(self.game.lock().await.state(), entity)
    }

    /// Every planet in ascending entity order.
    pub async fn planets(&self) -> Result<Vec<PlanetView>, ApiError> {
        let game = self.game.lock().await;
        let state = game.state();
        state
            .planet()
            .entities()
            .into_iter()
            .map(|entity| planet_view(state, entity))
            .collect()
    }

    /// Tiles of `area` inside `extent`, row by row.
    pub async fn area_tiles(
        &self,
        area: Entity,
        extent: AreaTilesExtent,
    ) -> Result<Vec<AreaTile>, ApiError> {
        Ok(self.game.lock().await.state().area().area_tiles(area, extent)?)
    }

    /// Seeds, optionally only those owned by `owner`.
    pub async fn seeds(&self, owner: Option<Entity>) -> Result<Vec<SeedView>, ApiError> {
        let game = self.game.lock().await;
        let state = game.state();
        let mut entities = state.seed().entities();
        if let Some(owner) = owner {
            entities = state
                .possession()
                .filter(&entities, |possession| possession.owner_entity == owner);
        }
        entities
            .into_iter()
            .map(|entity| -> Result<SeedView, ApiError> {
                Ok(SeedView {
                    entity,
                    seed: state.seed().get(entity)?,
                    position: state.area().position(entity).ok(),
                    possession: state.possession().get(entity).ok(),
                })
            })
            .collect()
    }

    /// Submit a planet creation.
    pub async fn create_planet(&self) -> Result<EventId, ApiError> {
        self.submit(CreatePlanet {}).await
    }

    /// Submit a player registration.
    pub async fn create_player(&self) -> Result<EventId, ApiError> {
        self.submit(CreatePlayer {}).await
    }

    /// Dry-run `body` against the world as it will be once every pending
    /// local submission lands, then stage it for the chain.
    ///
    /// The game lock is held only long enough to take a snapshot; the dry
    /// run happens on the blocking pool.
    pub async fn submit(&self, body: impl Into<EventBody>) -> Result<EventId, ApiError> {
        let body = body.into();
        let kind = body.kind();
        let _turn = self.submissions.lock().await;

        let snapshot = self.game.lock().await.clone();
        let pending = self.local_events.all();
        let candidate = Event::new(body.clone(), BlockTimestamp::default());
        tokio::task::spawn_blocking(move || dry_run(snapshot, pending, &candidate))
            .await
            .map_err(|err| ApiError::Task {
                reason: err.to_string(),
            })??;

        let id = self.local_events.add(body)?;
        info!(event_id = %id, kind = %kind, "Event submitted");
        Ok(id)
    }
}

/// Replay the pending events `game` has not applied yet, in chain order,
/// then apply `candidate` on top.
fn dry_run(
    mut game: Game,
    pending: BTreeMap<EventId, Event>,
    candidate: &Event,
) -> Result<EventOutcome, GameError> {
    let mut queued: Vec<(EventId, Event)> = pending
        .into_iter()
        .filter(|(id, _)| !game.has_applied(id))
        .collect();
    queued.sort_by(|(a_id, a), (b_id, b)| a.timestamp.cmp(&b.timestamp).then(a_id.cmp(b_id)));
    debug!(pending = queued.len(), "Replaying pending submissions");
    for (id, event) in queued {
        if let Err(err) = game.apply_event(&event) {
            warn!(event_id = %id, error = %err, "Pending submission no longer applies");
        }
    }
    game.apply_event(candidate)
}

fn planet_view(state: &State, entity: Entity) -> Result<PlanetView, ApiError> {
    Ok(PlanetView {
        entity,
        planet: state.planet().get(entity)?,
        area: state.area().area(entity)?,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};

    use dominion_chain::{AcceptAllSignatures, SignatureEventValidator, SignatureVerifier, TimeSource};
    use dominion_world::{PlanetSettings, WorldSettings};

    use super::*;

    /// Moves one millisecond forward on every read, so repeated
    /// submissions of the same payload stay distinct.
    #[derive(Debug)]
    struct TickingTime(AtomicU64);

    impl TimeSource for TickingTime {
        fn now(&self) -> BlockTimestamp {
            BlockTimestamp::from_unix_millis(self.0.fetch_add(1, Ordering::Relaxed))
        }
    }

    fn planet_limit_error(result: &Result<EventId, ApiError>) -> bool {
        matches!(
            result,
            Err(ApiError::Game {
                source: GameError::World {
                    source: WorldError::PlanetNameOutOfBounds(10)
                }
            })
        )
    }

    fn api() -> GameApi {
        let verifier: Arc<dyn SignatureVerifier> = Arc::new(AcceptAllSignatures);
        let settings = WorldSettings {
            time_compression: 1,
            planet: PlanetSettings::new(40, 60),
        };
        let game = Game::new(&settings, Arc::clone(&verifier)).unwrap();
        let backlog = LocalEventBacklog::new(
            Arc::new(SignatureEventValidator::new(verifier)),
            Arc::new(TickingTime(AtomicU64::new(7))),
        );
        GameApi::new(Arc::new(Mutex::new(game)), Arc::new(backlog))
    }

    #[tokio::test]
    async fn submission_stages_without_applying() {
        let api = api();
        let id = api.create_planet().await.unwrap();
        assert!(api.local_events.exists(&id));
        assert!(api.planets().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn doomed_events_never_reach_the_backlog() {
        let api = api();
        {
            let mut game = api.game.lock().await;
            for _ in 0..9 {
                game.apply_event(&Event::new(CreatePlanet {}, BlockTimestamp::default()))
                    .unwrap();
            }
        }
        assert!(planet_limit_error(&api.create_planet().await));
        assert!(api.local_events.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_submissions_respect_the_planet_limit() {
        let api = api();
        let submissions: Vec<_> = (0..12)
            .map(|_| {
                let api = api.clone();
                tokio::spawn(async move { api.create_planet().await })
            })
            .collect();

        let mut results = Vec::new();
        for submission in submissions {
            results.push(submission.await.unwrap());
        }
        let (accepted, refused): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);
        assert_eq!(accepted.len(), 9);
        assert_eq!(refused.len(), 3);
        assert!(refused.iter().all(planet_limit_error));
        assert_eq!(api.local_events.len(), 9);
    }

    #[tokio::test]
    async fn applied_submissions_are_not_counted_twice() {
        let api = api();
        for _ in 0..5 {
            api.create_planet().await.unwrap();
        }
        let mut staged: Vec<Event> = api.local_events.all().into_values().collect();
        staged.sort_by_key(|event| event.timestamp);
        {
            let mut game = api.game.lock().await;
            for event in staged.iter().take(3) {
                game.apply_event(event).unwrap();
            }
        }

        for _ in 0..4 {
            api.create_planet().await.unwrap();
        }
        assert!(planet_limit_error(&api.create_planet().await));
        assert_eq!(api.local_events.len(), 9);
    }

    #[tokio::test]
    async fn queries_reflect_applied_events() {
        let api = api();
        api.game
            .lock()
            .await
            .apply_event(&Event::new(CreatePlanet {}, BlockTimestamp::default()))
            .unwrap();

        let planets = api.planets().await.unwrap();
        assert_eq!(planets.len(), 1);
        let view = planets.into_iter().next().unwrap();
        assert_eq!(view.planet.name, "New Ganymede");
        assert_eq!(api.planet(view.entity).await.unwrap(), view);

        let tiles = api
            .area_tiles(view.entity, AreaTilesExtent::new(0, 0, 3, 1))
            .await
            .unwrap();
        assert_eq!(tiles.len(), 8);

        let owned = api.seeds(Some(view.entity)).await.unwrap();
        assert_eq!(owned.len(), api.seeds(None).await.unwrap().len());
        for seed in owned {
            assert_eq!(seed.possession.unwrap().owner_entity, view.entity);
            assert_eq!(seed.position.unwrap().entity, view.entity);
        }
    }

    #[tokio::test]
    async fn unknown_planet_is_an_error() {
        let api = api();
        assert!(matches!(
            api.planet(Entity::new(42)).await,
            Err(ApiError::World { .. })
        ));
    }
}
