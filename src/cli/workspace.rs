//! Per-invocation context: project, config, store and acting user

use miette::{miette, Result};

use crate::cli::GlobalOpts;
use crate::core::actor::Actor;
use crate::core::config::Config;
use crate::core::engine::{Engine, ViewDefaults};
use crate::core::project::Project;
use crate::core::session::Session;
use crate::core::store::Store;

pub struct Workspace {
    pub project: Project,
    pub config: Config,
    pub store: Store,
    pub actor: Actor,
    session_id: String,
}

impl Workspace {
    /// Discover the project and resolve the acting user
    pub fn open(global: &GlobalOpts) -> Result<Self> {
        let project = match &global.project {
            Some(path) => Project::discover_from(path),
            None => Project::discover(),
        }
        .map_err(|e| miette!("{}", e))?;

        let config = Config::load_for(Some(&project));
        let user_id = global.user.or(config.user).ok_or_else(|| {
            miette!(
                help = "Pass --user <ID>, set VOTELIST_USER, or add `user:` to .votelist/config.yaml",
                "No acting user configured"
            )
        })?;
        let actor = Actor::new(user_id, global.account.or(config.account));
        let store = Store::open(&project)?;
        tracing::debug!(user = actor.user_id, account = ?actor.account_id, "workspace opened");

        Ok(Self {
            project,
            config,
            store,
            actor,
            session_id: global.session.clone(),
        })
    }

    pub fn defaults(&self) -> ViewDefaults {
        ViewDefaults::from_config(&self.config)
    }

    pub fn engine(&self) -> Result<Engine<'_>> {
        Ok(Engine::new(&self.store, &self.store, self.defaults())?)
    }

    pub fn session(&self) -> Session<'_> {
        Session::new(
            self.session_id.clone(),
            &self.store,
            self.config.session_ttl_minutes(),
        )
    }
}
