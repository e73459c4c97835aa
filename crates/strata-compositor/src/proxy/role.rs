use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

/// Logical execution context an operation runs in.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Role {
    /// Scene authoring side.
    Main,
    /// Renderer side.
    Impl,
}

impl Role {
    const fn to_bits(self) -> u8 {
        match self {
            Role::Main => 0,
            Role::Impl => 1,
        }
    }

    const fn from_bits(bits: u8) -> Self {
        match bits {
            1 => Role::Impl,
            _ => Role::Main,
        }
    }
}

#[derive(Debug, Default)]
struct RoleState {
    current: AtomicU8,
    main_blocked: AtomicBool,
}

/// Shared marker recording which role is currently executing.
///
/// Clones observe the same marker. Roles are only changed through the scoped
/// guards returned by [`RoleMarker::enter`] and [`RoleMarker::block_main`],
/// which restore the previous state when dropped.
#[derive(Debug, Clone, Default)]
pub struct RoleMarker {
    state: Arc<RoleState>,
}

impl RoleMarker {
    /// New marker, starting in the main role.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Role {
        Role::from_bits(self.state.current.load(Ordering::Acquire))
    }

    pub fn is_main(&self) -> bool {
        self.current() == Role::Main
    }

    pub fn is_impl(&self) -> bool {
        self.current() == Role::Impl
    }

    /// Whether the main role is parked while the impl role uses its data.
    pub fn is_main_blocked(&self) -> bool {
        self.state.main_blocked.load(Ordering::Acquire)
    }

    /// Switches to `role` until the guard drops.
    #[must_use = "the role is restored as soon as the guard is dropped"]
    pub fn enter(&self, role: Role) -> RoleGuard {
        let previous = Role::from_bits(self.state.current.swap(role.to_bits(), Ordering::AcqRel));
        RoleGuard {
            marker: self.clone(),
            previous,
        }
    }

    /// Marks the main role blocked until the guard drops.
    #[must_use = "the main role is unblocked as soon as the guard is dropped"]
    pub fn block_main(&self) -> MainBlockedGuard {
        let previous = self.state.main_blocked.swap(true, Ordering::AcqRel);
        MainBlockedGuard {
            marker: self.clone(),
            previous,
        }
    }
}

/// Restores the previous role on drop.
#[derive(Debug)]
pub struct RoleGuard {
    marker: RoleMarker,
    previous: Role,
}

impl Drop for RoleGuard {
    fn drop(&mut self) {
        self.marker
            .state
            .current
            .store(self.previous.to_bits(), Ordering::Release);
    }
}

/// Restores the previous main-blocked state on drop.
#[derive(Debug)]
pub struct MainBlockedGuard {
    marker: RoleMarker,
    previous: bool,
}

impl Drop for MainBlockedGuard {
    fn drop(&mut self) {
        self.marker
            .state
            .main_blocked
            .store(self.previous, Ordering::Release);
    }
}
