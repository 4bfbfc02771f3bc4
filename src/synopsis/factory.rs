use std::{collections::HashMap, fmt};

use sieve_predicate::{Type, TypeKind};

use super::{BoolSynopsis, OpaquePayload, OpaqueSynopsis, Synopsis, TimeSynopsis};
use crate::{
    config::SynopsisOptions,
    error::SynopsisError,
    logging::{sieve_log, LogContext},
};

const FACTORY_LOG_CTX: LogContext = LogContext::new("component=synopsis_factory");

/// Creates an empty synopsis for a column of the given type.
pub type SynopsisConstructor = fn(Type) -> Box<dyn Synopsis>;

/// Restores a synopsis from its opaque payload.
pub type OpaqueDecoder = fn(Type, &OpaquePayload) -> Result<Box<dyn Synopsis>, SynopsisError>;

/// Registry from type kind to synopsis constructor.
///
/// Built once and passed to whatever builds or decodes synopses.
#[derive(Clone, Default)]
pub struct SynopsisFactory {
    constructors: HashMap<&'static str, SynopsisConstructor>,
    decoders: HashMap<String, OpaqueDecoder>,
}

impl SynopsisFactory {
    /// A factory without any registrations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A factory with every built-in synopsis registered.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::with_options(&SynopsisOptions::default())
    }

    /// A factory with the built-in synopses `options` enables.
    #[must_use]
    pub fn with_options(options: &SynopsisOptions) -> Self {
        let mut factory = Self::new();
        if options.bool_synopses {
            factory.register(TypeKind::Bool.name(), bool_synopsis);
        }
        if options.time_synopses {
            factory.register(TypeKind::Time.name(), time_synopsis);
        }
        factory
    }

    /// Registers `constructor` for columns whose type kind is named `kind`.
    pub fn register(&mut self, kind: &'static str, constructor: SynopsisConstructor) -> &mut Self {
        self.constructors.insert(kind, constructor);
        self
    }

    /// Registers `decoder` for opaque payloads written by `name`.
    pub fn register_decoder(&mut self, name: impl Into<String>, decoder: OpaqueDecoder) -> &mut Self {
        self.decoders.insert(name.into(), decoder);
        self
    }

    /// An empty synopsis for `ty`, or `None` if its kind is not registered.
    #[must_use]
    pub fn make(&self, ty: &Type) -> Option<Box<dyn Synopsis>> {
        self.constructors
            .get(ty.kind().name())
            .map(|constructor| constructor(ty.clone()))
    }

    /// Restores an opaque payload.
    ///
    /// Payloads without a working decoder are kept as [`OpaqueSynopsis`].
    #[must_use]
    pub fn decode_opaque(&self, ty: Type, payload: OpaquePayload) -> Box<dyn Synopsis> {
        if let Some(decoder) = self.decoders.get(&payload.name) {
            match decoder(ty.clone(), &payload) {
                Ok(synopsis) => return synopsis,
                Err(err) => {
                    sieve_log!(
                        log::Level::Warn,
                        ctx: FACTORY_LOG_CTX,
                        "opaque_decode_failed",
                        "name={} version={} error={}",
                        payload.name,
                        payload.version,
                        err,
                    );
                }
            }
        } else {
            sieve_log!(
                log::Level::Debug,
                ctx: FACTORY_LOG_CTX,
                "opaque_kept",
                "name={} version={} bytes={}",
                payload.name,
                payload.version,
                payload.blob.len(),
            );
        }
        Box::new(OpaqueSynopsis::new(ty, payload))
    }
}

fn bool_synopsis(ty: Type) -> Box<dyn Synopsis> {
    Box::new(BoolSynopsis::new(ty))
}

fn time_synopsis(ty: Type) -> Box<dyn Synopsis> {
    Box::new(TimeSynopsis::new(ty))
}

impl fmt::Debug for SynopsisFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.constructors.keys().collect();
        kinds.sort();
        let mut decoders: Vec<_> = self.decoders.keys().collect();
        decoders.sort();
        f.debug_struct("SynopsisFactory")
            .field("kinds", &kinds)
            .field("decoders", &decoders)
            .finish()
    }
}
