use std::num::NonZeroUsize;

use log::error;
use thiserror::Error;

use crate::{
    link::{base_link::Link, link_config::LinkConfig},
    transport::Connection,
};

/// Stable reference to a link in a `LinkRegistry`. There is no zero handle;
/// "no link" is `Option::<LinkHandle>::None`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct LinkHandle(NonZeroUsize);

impl LinkHandle {
    fn from_index(index: usize) -> Self {
        Self(NonZeroUsize::MIN.saturating_add(index))
    }

    fn index(self) -> usize {
        self.0.get() - 1
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("link handle {0} is out of range")]
    OutOfRange(usize),
    #[error("link handle {0} was already released")]
    AlreadyReleased(usize),
}

/// Owns every link. Freed slots are reused before the table grows.
pub struct LinkRegistry {
    config: LinkConfig,
    links: Vec<Option<Link>>,
}

impl LinkRegistry {
    pub fn new(config: LinkConfig) -> Self {
        Self {
            config,
            links: Vec::new(),
        }
    }

    pub fn acquire(&mut self, connection: Box<dyn Connection>) -> LinkHandle {
        let link = Link::new(connection, self.config.clone());
        match self.links.iter().position(Option::is_none) {
            Some(index) => {
                self.links[index] = Some(link);
                LinkHandle::from_index(index)
            }
            None => {
                self.links.push(Some(link));
                LinkHandle::from_index(self.links.len() - 1)
            }
        }
    }

    pub fn try_release(&mut self, handle: LinkHandle) -> Result<(), RegistryError> {
        let slot = self
            .links
            .get_mut(handle.index())
            .ok_or(RegistryError::OutOfRange(handle.get()))?;
        let mut link = slot
            .take()
            .ok_or(RegistryError::AlreadyReleased(handle.get()))?;
        link.dispose();
        Ok(())
    }

    /// Disposes the link behind `handle`. A stale handle is logged and
    /// reported as `false`.
    pub fn release(&mut self, handle: LinkHandle) -> bool {
        match self.try_release(handle) {
            Ok(()) => true,
            Err(err) => {
                error!("{}", err);
                false
            }
        }
    }

    pub fn release_all(&mut self) {
        for mut link in self.links.drain(..).flatten() {
            link.dispose();
        }
    }

    pub fn try_get(&self, handle: LinkHandle) -> Option<&Link> {
        self.links.get(handle.index()).and_then(Option::as_ref)
    }

    pub fn try_get_mut(&mut self, handle: LinkHandle) -> Option<&mut Link> {
        self.links.get_mut(handle.index()).and_then(Option::as_mut)
    }

    /// Panics if `handle` was released or never issued by this registry.
    pub fn get(&self, handle: LinkHandle) -> &Link {
        self.try_get(handle)
            .unwrap_or_else(|| panic!("invalid link handle {}", handle.get()))
    }

    /// Panics if `handle` was released or never issued by this registry.
    pub fn get_mut(&mut self, handle: LinkHandle) -> &mut Link {
        self.try_get_mut(handle)
            .unwrap_or_else(|| panic!("invalid link handle {}", handle.get()))
    }

    pub fn len(&self) -> usize {
        self.links.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (LinkHandle, &mut Link)> {
        self.links
            .iter_mut()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_mut().map(|link| (LinkHandle::from_index(index), link)))
    }
}
