//! Open codec sessions.

use crate::codec::{CodecDescriptor, Direction};
use crate::config::CodecConfig;
use crate::engine::{CodecEngine, DecoderBackend, EncoderBackend, SessionBackend};
use avpump_core::{Error, Result};
use tracing::debug;

/// An open encoder or decoder.
///
/// The session owns its engine backend and closes it exactly once, either
/// through [`close`](Self::close) or when dropped.
pub struct CodecSession<B: SessionBackend + ?Sized> {
    descriptor: CodecDescriptor,
    config: CodecConfig,
    backend: Option<Box<B>>,
}

/// An encoding session.
pub type EncoderSession = CodecSession<EncoderBackend>;

/// A decoding session.
pub type DecoderSession = CodecSession<DecoderBackend>;

impl CodecSession<EncoderBackend> {
    /// Validate `config` and open an encoder for `descriptor`.
    pub fn open_encoder(
        engine: &dyn CodecEngine,
        descriptor: CodecDescriptor,
        config: CodecConfig,
    ) -> Result<Self> {
        check(&descriptor, &config, Direction::Encode)?;
        let backend = engine.open_encoder(&descriptor, &config)?;
        Ok(Self::opened(descriptor, config, backend))
    }
}

impl CodecSession<DecoderBackend> {
    /// Validate `config` and open a decoder for `descriptor`.
    pub fn open_decoder(
        engine: &dyn CodecEngine,
        descriptor: CodecDescriptor,
        config: CodecConfig,
    ) -> Result<Self> {
        check(&descriptor, &config, Direction::Decode)?;
        let backend = engine.open_decoder(&descriptor, &config)?;
        Ok(Self::opened(descriptor, config, backend))
    }
}

impl<B: SessionBackend + ?Sized> CodecSession<B> {
    /// Wrap a backend that was opened outside an engine.
    ///
    /// The configuration is validated the same way as for engine sessions.
    pub fn with_backend(
        descriptor: CodecDescriptor,
        config: CodecConfig,
        backend: Box<B>,
    ) -> Result<Self> {
        check(&descriptor, &config, descriptor.direction)?;
        Ok(Self::opened(descriptor, config, backend))
    }

    fn opened(descriptor: CodecDescriptor, config: CodecConfig, backend: Box<B>) -> Self {
        debug!(
            codec = %descriptor.id,
            media = %descriptor.media_type,
            frame_size = backend.frame_size(),
            "codec session opened"
        );
        Self {
            descriptor,
            config,
            backend: Some(backend),
        }
    }

    /// The codec descriptor.
    pub fn descriptor(&self) -> &CodecDescriptor {
        &self.descriptor
    }

    /// The configuration the session was opened with.
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Whether the session is still open.
    pub fn is_open(&self) -> bool {
        self.backend.is_some()
    }

    /// Samples per frame the codec requires, or 0 for any size.
    pub fn frame_size(&self) -> usize {
        self.backend.as_ref().map_or(0, |b| b.frame_size())
    }

    /// The engine backend.
    pub fn backend_mut(&mut self) -> Result<&mut B> {
        match self.backend.as_deref_mut() {
            Some(backend) => Ok(backend),
            None => Err(Error::not_initialized(format!(
                "{} session is closed",
                self.descriptor.id
            ))),
        }
    }

    /// Release the backend. Later calls do nothing.
    pub fn close(&mut self) {
        if let Some(mut backend) = self.backend.take() {
            backend.close();
            debug!(codec = %self.descriptor.id, "codec session closed");
        }
    }
}

impl<B: SessionBackend + ?Sized> Drop for CodecSession<B> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<B: SessionBackend + ?Sized> std::fmt::Debug for CodecSession<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecSession")
            .field("codec", &self.descriptor.id)
            .field("open", &self.is_open())
            .finish()
    }
}

fn check(descriptor: &CodecDescriptor, config: &CodecConfig, direction: Direction) -> Result<()> {
    if descriptor.direction != direction {
        return Err(Error::invalid_config(format!(
            "{} is not usable for {:?}",
            descriptor.id, direction
        )));
    }
    config.validate(descriptor.media_type)?;
    descriptor.capabilities.check(&descriptor.id, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{CodecCapabilities, CodecId, MediaType};
    use crate::status::Status;
    use avpump_core::{ChannelLayout, CodecError, Frame, Packet, SampleFormat};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct NullEncoder {
        closes: Arc<AtomicUsize>,
    }

    impl SessionBackend for NullEncoder {
        type Input = Frame;
        type Output = Packet;

        fn send(&mut self, _input: Option<&Frame>) -> Status {
            Status::Ok
        }

        fn receive(&mut self, _output: &mut Packet) -> Status {
            Status::NeedsInput
        }

        fn frame_size(&self) -> usize {
            1024
        }

        fn close(&mut self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Engine that counts how often it is asked to open anything.
    struct CountingEngine {
        opens: AtomicUsize,
        closes: Arc<AtomicUsize>,
    }

    impl CountingEngine {
        fn new() -> Self {
            Self {
                opens: AtomicUsize::new(0),
                closes: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl CodecEngine for CountingEngine {
        fn find_encoder(&self, id: &CodecId) -> Result<CodecDescriptor> {
            Err(CodecError::NotFound(id.to_string()).into())
        }

        fn find_decoder(&self, id: &CodecId) -> Result<CodecDescriptor> {
            Err(CodecError::NotFound(id.to_string()).into())
        }

        fn open_encoder(
            &self,
            _: &CodecDescriptor,
            _: &CodecConfig,
        ) -> Result<Box<EncoderBackend>> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(NullEncoder {
                closes: Arc::clone(&self.closes),
            }))
        }

        fn open_decoder(
            &self,
            _: &CodecDescriptor,
            _: &CodecConfig,
        ) -> Result<Box<DecoderBackend>> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            Err(CodecError::OpenFailed {
                codec: "null".into(),
                message: "no decoder".into(),
            }
            .into())
        }
    }

    fn s16_encoder() -> CodecDescriptor {
        CodecDescriptor::new("null", "null", MediaType::Audio, Direction::Encode).with_capabilities(
            CodecCapabilities::any().with_sample_formats([SampleFormat::S16]),
        )
    }

    #[test]
    fn test_validation_precedes_engine() {
        let engine = CountingEngine::new();

        let zero_rate = CodecConfig::audio(SampleFormat::S16, ChannelLayout::Stereo, 0);
        let err = EncoderSession::open_encoder(&engine, s16_encoder(), zero_rate).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(_)));

        let float = CodecConfig::audio(SampleFormat::F32, ChannelLayout::Stereo, 48000);
        let err = EncoderSession::open_encoder(&engine, s16_encoder(), float).unwrap_err();
        assert!(matches!(err, Error::UnsupportedCapability(_)));

        assert_eq!(engine.opens.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_open_failure_surfaces_codec_error() {
        let engine = CountingEngine::new();
        let descriptor = CodecDescriptor::new("null", "null", MediaType::Audio, Direction::Decode);
        let config = CodecConfig::audio(SampleFormat::S16, ChannelLayout::Stereo, 48000);
        let err = DecoderSession::open_decoder(&engine, descriptor, config).unwrap_err();
        assert!(matches!(err, Error::Codec(CodecError::OpenFailed { .. })));
    }

    #[test]
    fn test_direction_mismatch() {
        let engine = CountingEngine::new();
        let config = CodecConfig::audio(SampleFormat::S16, ChannelLayout::Stereo, 48000);
        let err = DecoderSession::open_decoder(&engine, s16_encoder(), config).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_close_is_idempotent() {
        let engine = CountingEngine::new();
        let config = CodecConfig::audio(SampleFormat::S16, ChannelLayout::Stereo, 48000);
        let mut session = EncoderSession::open_encoder(&engine, s16_encoder(), config).unwrap();
        assert_eq!(session.frame_size(), 1024);

        session.close();
        session.close();
        assert!(!session.is_open());
        assert_eq!(session.frame_size(), 0);
        assert!(matches!(session.backend_mut(), Err(Error::NotInitialized(_))));

        drop(session);
        assert_eq!(engine.closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_closes() {
        let engine = CountingEngine::new();
        let config = CodecConfig::audio(SampleFormat::S16, ChannelLayout::Stereo, 48000);
        drop(EncoderSession::open_encoder(&engine, s16_encoder(), config).unwrap());
        assert_eq!(engine.closes.load(Ordering::SeqCst), 1);
    }
}
