//! Symbol router
//!
//! Maps each configured symbol to its worker. The symbol set is fixed at
//! startup; requests for anything else are refused.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, warn};
use types::ids::MarketId;

use crate::engine::MatchingConfig;
use crate::error::RouterError;
use crate::worker::{ExecutionListener, SymbolHandle};

pub struct MatchingRouter {
    handles: HashMap<String, SymbolHandle>,
    tasks: Vec<JoinHandle<()>>,
}

impl MatchingRouter {
    /// Spawn one worker per symbol, all sharing `listener`
    pub fn start(
        symbols: impl IntoIterator<Item = MarketId>,
        config: &MatchingConfig,
        listener: Arc<dyn ExecutionListener>,
    ) -> Self {
        let mut handles = HashMap::new();
        let mut tasks = Vec::new();

        for symbol in symbols {
            if handles.contains_key(symbol.as_str()) {
                warn!(%symbol, "Duplicate symbol ignored");
                continue;
            }
            let (handle, task) = SymbolHandle::spawn(symbol.clone(), config, Arc::clone(&listener));
            handles.insert(symbol.as_str().to_string(), handle);
            tasks.push(task);
        }

        info!(symbols = handles.len(), "Matching router started");
        Self { handles, tasks }
    }

    pub fn handle(&self, symbol: &str) -> Result<&SymbolHandle, RouterError> {
        self.handles.get(symbol).ok_or_else(|| RouterError::UnknownSymbol {
            symbol: symbol.to_string(),
        })
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.handles.contains_key(symbol)
    }

    /// Configured symbols, sorted
    pub fn symbols(&self) -> Vec<MarketId> {
        let mut symbols: Vec<MarketId> = self.handles.values().map(|h| h.symbol().clone()).collect();
        symbols.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        symbols
    }

    /// Inbound queue depth per symbol
    pub fn queue_depths(&self) -> Vec<(MarketId, usize)> {
        self.symbols()
            .into_iter()
            .filter_map(|symbol| {
                let depth = self.handles.get(symbol.as_str())?.queue_depth();
                Some((symbol, depth))
            })
            .collect()
    }

    /// Close every queue and wait for the workers to drain
    ///
    /// Workers exit once every clone of their handle is gone.
    pub async fn shutdown(self) {
        let Self { handles, tasks } = self;
        drop(handles);
        for task in tasks {
            if let Err(err) = task.await {
                warn!(error = %err, "Symbol worker ended abnormally");
            }
        }
        info!("Matching router stopped");
    }
}
