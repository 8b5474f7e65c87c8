//! Message kinds and the fixed wire layout.
//!
//! # Responsibility
//! - Enumerate every message the host may deliver to a module.
//! - Pin the byte layout of `Message` that independently-compiled modules
//!   rely on.
//!
//! # Invariants
//! - `Message` is exactly 16 bytes on every build; checked at compile time.
//! - Message-kind codes are stable across releases and never reused.
//! - The kind enumeration is closed: unknown codes decode to `None`, never
//!   to a misinterpreted variant.

use std::ffi::c_void;
use std::ptr;

/// Wire size of [`Message`] in bytes, identical on every target.
pub const MESSAGE_WIRE_SIZE: usize = 16;

/// Closed enumeration of every host-to-module message.
///
/// Codes are carried on the wire as the first 8 bytes of [`Message`]. The
/// numeric values are part of the cross-binary contract: they are spaced by
/// group so future additions stay inside their group's range, and an
/// existing value is never reassigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u64)]
pub enum MessageKind {
    /// Sent exactly once after a module becomes functional.
    Initialize = 0,
    /// Host application is shutting down.
    Shutdown = 1,
    /// The tool hosting this module is about to be reloaded.
    Reload = 2,

    /// Host content (e.g. a title image) finished loading.
    OnLoad = 10,
    /// Sent exactly once before the module handle is closed.
    OnUnload = 11,
    /// One presentation frame completed.
    OnFrame = 12,
    /// One emulation update step completed.
    OnUpdate = 13,
    /// Host execution paused.
    OnPaused = 14,
    /// Host execution resumed.
    OnResumed = 15,
    /// Execution stopped on a breakpoint.
    OnBreakpoint = 16,
    /// A single-step request finished.
    OnStepComplete = 17,
    /// Payload carries a borrowed [`FrameTexture`](super::FrameTexture).
    FrameTexture = 18,

    DebugBreak = 30,
    DebugContinue = 31,
    DebugStep = 32,
    DebugStepOver = 33,
    DebugStepOut = 34,
    DebugAddBreakpoint = 35,
    DebugRemoveBreakpoint = 36,
    DebugClearBreakpoints = 37,

    /// Payload carries a borrowed [`HostCallbacks`](super::HostCallbacks);
    /// sent exactly once per successful load, immediately after
    /// [`MessageKind::Initialize`].
    Callbacks = 50,
}

/// Protocol group a message kind belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageGroup {
    /// Tool lifecycle transitions.
    Lifecycle,
    /// Steady-state engine events forwarded from the host loop.
    Engine,
    /// Debugger commands forwarded from the host breakpoint/step engine.
    Debug,
    /// Capability delivery.
    Capability,
}

impl MessageKind {
    /// Every kind in the closed enumeration, in wire-code order.
    pub const ALL: [MessageKind; 21] = [
        MessageKind::Initialize,
        MessageKind::Shutdown,
        MessageKind::Reload,
        MessageKind::OnLoad,
        MessageKind::OnUnload,
        MessageKind::OnFrame,
        MessageKind::OnUpdate,
        MessageKind::OnPaused,
        MessageKind::OnResumed,
        MessageKind::OnBreakpoint,
        MessageKind::OnStepComplete,
        MessageKind::FrameTexture,
        MessageKind::DebugBreak,
        MessageKind::DebugContinue,
        MessageKind::DebugStep,
        MessageKind::DebugStepOver,
        MessageKind::DebugStepOut,
        MessageKind::DebugAddBreakpoint,
        MessageKind::DebugRemoveBreakpoint,
        MessageKind::DebugClearBreakpoints,
        MessageKind::Callbacks,
    ];

    /// Returns the stable wire code for this kind.
    pub const fn code(self) -> u64 {
        self as u64
    }

    /// Decodes one wire code back into a kind.
    ///
    /// Unknown codes return `None`; they must never be silently coerced
    /// into a neighboring variant.
    pub const fn from_code(code: u64) -> Option<MessageKind> {
        match code {
            0 => Some(MessageKind::Initialize),
            1 => Some(MessageKind::Shutdown),
            2 => Some(MessageKind::Reload),
            10 => Some(MessageKind::OnLoad),
            11 => Some(MessageKind::OnUnload),
            12 => Some(MessageKind::OnFrame),
            13 => Some(MessageKind::OnUpdate),
            14 => Some(MessageKind::OnPaused),
            15 => Some(MessageKind::OnResumed),
            16 => Some(MessageKind::OnBreakpoint),
            17 => Some(MessageKind::OnStepComplete),
            18 => Some(MessageKind::FrameTexture),
            30 => Some(MessageKind::DebugBreak),
            31 => Some(MessageKind::DebugContinue),
            32 => Some(MessageKind::DebugStep),
            33 => Some(MessageKind::DebugStepOver),
            34 => Some(MessageKind::DebugStepOut),
            35 => Some(MessageKind::DebugAddBreakpoint),
            36 => Some(MessageKind::DebugRemoveBreakpoint),
            37 => Some(MessageKind::DebugClearBreakpoints),
            50 => Some(MessageKind::Callbacks),
            _ => None,
        }
    }

    /// Returns the protocol group this kind belongs to.
    pub const fn group(self) -> MessageGroup {
        match self {
            MessageKind::Initialize | MessageKind::Shutdown | MessageKind::Reload => {
                MessageGroup::Lifecycle
            }
            MessageKind::OnLoad
            | MessageKind::OnUnload
            | MessageKind::OnFrame
            | MessageKind::OnUpdate
            | MessageKind::OnPaused
            | MessageKind::OnResumed
            | MessageKind::OnBreakpoint
            | MessageKind::OnStepComplete
            | MessageKind::FrameTexture => MessageGroup::Engine,
            MessageKind::DebugBreak
            | MessageKind::DebugContinue
            | MessageKind::DebugStep
            | MessageKind::DebugStepOver
            | MessageKind::DebugStepOut
            | MessageKind::DebugAddBreakpoint
            | MessageKind::DebugRemoveBreakpoint
            | MessageKind::DebugClearBreakpoints => MessageGroup::Debug,
            MessageKind::Callbacks => MessageGroup::Capability,
        }
    }
}

/// Fixed-layout message value passed into a module entry point.
///
/// The layout is the whole cross-binary contract: 8 bytes of kind code
/// followed by an 8-byte payload slot. `payload` is *borrowed* — it is
/// valid only for the duration of the synchronous call that carries it,
/// and no receiver may retain it afterward. Both sides must be compiled
/// against the same protocol revision; nothing at runtime re-negotiates
/// this layout.
#[derive(Debug, Clone, Copy)]
#[repr(C, align(8))]
pub struct Message {
    /// Wire code of the [`MessageKind`] being delivered.
    pub kind: u64,
    /// Borrowed, kind-specific payload; null when the kind carries none.
    pub payload: *mut c_void,
}

// Build-time layout contract. A target where this fails cannot speak the
// protocol and must not compile.
const _: () = assert!(std::mem::size_of::<Message>() == MESSAGE_WIRE_SIZE);
const _: () = assert!(std::mem::align_of::<Message>() == 8);

impl Message {
    /// Creates a payload-free message.
    pub fn new(kind: MessageKind) -> Self {
        Self {
            kind: kind.code(),
            payload: ptr::null_mut(),
        }
    }

    /// Creates a message carrying a borrowed payload pointer.
    pub fn with_payload(kind: MessageKind, payload: *mut c_void) -> Self {
        Self {
            kind: kind.code(),
            payload,
        }
    }

    /// Decodes the carried kind, or `None` for a foreign/unknown code.
    pub fn decode_kind(&self) -> Option<MessageKind> {
        MessageKind::from_code(self.kind)
    }
}
