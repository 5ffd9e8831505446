use crate::{container::DiContainer, errors::InitError};

/// Eagerly constructs the scoped bindings of a freshly built container
///
/// Bindings are constructed dependencies first, the first failing provider aborts.
pub(crate) struct DiInitiator<'a> {
    container: &'a DiContainer,
}
impl<'a> DiInitiator<'a> {
    pub(crate) fn new(container: &'a DiContainer) -> Self {
        DiInitiator { container }
    }

    pub(crate) fn initiate(self) -> Result<(), InitError> {
        let graph = self.container.graph();
        let scoped: Vec<_> = graph
            .construction_order()?
            .into_iter()
            .filter(|key| graph.is_scoped(key))
            .collect();

        let total = scoped.len();
        tracing::debug!(
            "Initializing '{}' with {total} scoped bindings",
            self.container.label()
        );

        for (done, key) in scoped.iter().enumerate() {
            tracing::debug!("Waiting for {key} [{done} of {total} complete]");
            if let Err(e) = self.container.require_key(key) {
                tracing::error!("Eager construction of {key} failed: {e}");
                return Err(e.into());
            }
        }

        tracing::debug!("All {total} scoped bindings of '{}' constructed", self.container.label());
        Ok(())
    }
}
