/// Caller-supplied parameters to `start_all`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StartOptions {
    /// Restart already-configured containers instead of initializing fresh
    /// ones: `restart_with_timeout` is invoked in place of `init_and_start`.
    pub restart: bool,
    /// Seconds to wait for a graceful stop before a restart forces a kill;
    /// only consulted when `restart` is set. `None` defers to each
    /// container's own configured default.
    pub timeout: Option<u64>,
}

/// Caller-supplied parameters to `stop_all`. Not read from the environment
/// or a config file; the engine has no config surface of its own, these
/// are values the embedding runtime already has on hand (e.g. from a CLI
/// flag or API request it is servicing).
#[derive(Debug, Clone, Copy, Default)]
pub struct StopOptions {
    /// Seconds to wait for a graceful stop; `None` defers to each
    /// container's own configured default.
    pub timeout: Option<u64>,
    /// Run each container's full cleanup after it stops.
    pub cleanup: bool,
}

/// Caller-supplied parameters to `remove_all`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveOptions {
    pub force: bool,
    pub remove_pod: bool,
    pub timeout: Option<u64>,
}
