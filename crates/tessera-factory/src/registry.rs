//! Registry dispatching byte buffers to decode strategies
//!
//! Every request runs the same pipeline: validate the shape and buffer
//! length, look up the strategy for the dtype, decode, and hand back an
//! [`AnyTensor`] bound to the matching backend.

use std::collections::HashMap;
use std::sync::OnceLock;

use tessera_tensor::{AnyTensor, DType, Shape};
use tracing::{debug, info, trace};

use crate::config::FactoryConfig;
use crate::decode::{default_strategies, validate_length, DecodeStrategy, Endianness};
use crate::error::{FactoryError, Result};

/// One decode request
#[derive(Debug, Clone, PartialEq)]
pub struct TensorSpec {
    /// Element encoding of `bytes`
    pub dtype: DType,
    /// Logical dimensions
    pub shape: Vec<usize>,
    /// Raw buffer
    pub bytes: Vec<u8>,
    /// Name in the batch result; defaults to `tensor_<index>`
    pub name: Option<String>,
    /// Byte order; defaults to the registry configuration
    pub endianness: Option<Endianness>,
}

impl TensorSpec {
    /// Creates an unnamed request using the default byte order
    pub fn new(dtype: DType, shape: impl Into<Vec<usize>>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            dtype,
            shape: shape.into(),
            bytes: bytes.into(),
            name: None,
            endianness: None,
        }
    }

    /// Sets the batch name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the byte order
    pub fn with_endianness(mut self, endianness: Endianness) -> Self {
        self.endianness = Some(endianness);
        self
    }
}

/// Maps dtypes to decode strategies
#[derive(Debug, Default)]
pub struct FactoryRegistry {
    strategies: HashMap<DType, Box<dyn DecodeStrategy>>,
    initialized: bool,
    config: FactoryConfig,
}

impl FactoryRegistry {
    /// Creates an empty registry with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry with the given configuration
    pub fn with_config(config: FactoryConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Creates a registry holding every built-in strategy
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.initialize();
        registry
    }

    /// Registers the built-in strategies once
    ///
    /// Strategies registered earlier for a dtype are kept.
    pub fn initialize(&mut self) {
        if self.initialized {
            return;
        }
        for strategy in default_strategies() {
            self.strategies.entry(strategy.dtype()).or_insert(strategy);
        }
        self.initialized = true;
        info!("Initialized tensor factory with {} decode strategies", self.strategies.len());
    }

    /// Returns whether the built-in strategies have been registered
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Installs a strategy, returning the one it replaces
    pub fn register(&mut self, strategy: Box<dyn DecodeStrategy>) -> Option<Box<dyn DecodeStrategy>> {
        let dtype = strategy.dtype();
        debug!(%dtype, ?strategy, "registering decode strategy");
        self.strategies.insert(dtype, strategy)
    }

    /// Registered dtypes in declaration order
    pub fn registered_dtypes(&self) -> Vec<DType> {
        let mut dtypes: Vec<DType> = self.strategies.keys().copied().collect();
        dtypes.sort();
        dtypes
    }

    /// Active configuration
    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    /// Decodes a buffer with the configured default byte order
    pub fn create_tensor(&self, dtype: DType, shape: &[usize], bytes: &[u8]) -> Result<AnyTensor> {
        self.create_tensor_with(dtype, shape, bytes, self.config.default_endianness)
    }

    /// Decodes a buffer with an explicit byte order
    pub fn create_tensor_with(
        &self,
        dtype: DType,
        shape: &[usize],
        bytes: &[u8],
        endianness: Endianness,
    ) -> Result<AnyTensor> {
        // Validate
        let shape = Shape::from_slice(shape)?;
        if bytes.len() > self.config.max_tensor_bytes {
            return Err(FactoryError::InputTooLarge {
                bytes: bytes.len(),
                limit: self.config.max_tensor_bytes,
            });
        }
        validate_length(dtype, &shape, bytes.len())?;

        // Dispatch
        let strategy = self
            .strategies
            .get(&dtype)
            .ok_or_else(|| FactoryError::UnregisteredDType {
                requested: dtype,
                registered: self.registered_dtypes(),
            })?;
        if !strategy.supports(endianness) {
            return Err(FactoryError::NotImplemented {
                dtype,
                detail: format!("{} byte order is not supported by {:?}", endianness, strategy),
            });
        }

        // Decode
        debug!(%dtype, %shape, bytes = bytes.len(), %endianness, "decoding tensor");
        let tensor = strategy.decode(bytes, shape, endianness)?;

        // Wrap
        if tensor.dtype() != dtype {
            return Err(FactoryError::NotImplemented {
                dtype,
                detail: format!("strategy produced a {} tensor", tensor.dtype()),
            });
        }
        Ok(tensor)
    }

    /// Decodes every spec, stopping at the first failure
    ///
    /// Unnamed specs are named `tensor_<index>`. Two specs resolving to the
    /// same name are an error.
    pub fn create_batch(&self, specs: &[TensorSpec]) -> Result<HashMap<String, AnyTensor>> {
        if specs.len() > self.config.max_batch_entries {
            return Err(FactoryError::BatchTooLarge {
                entries: specs.len(),
                limit: self.config.max_batch_entries,
            });
        }

        let mut tensors = HashMap::with_capacity(specs.len());
        for (index, spec) in specs.iter().enumerate() {
            let name = spec.name.clone().unwrap_or_else(|| format!("tensor_{}", index));
            if tensors.contains_key(&name) {
                return Err(FactoryError::DuplicateName(name));
            }

            trace!(index, total = specs.len(), name = %name, "decoding batch entry");
            let endianness = spec.endianness.unwrap_or(self.config.default_endianness);
            let tensor = self
                .create_tensor_with(spec.dtype, &spec.shape, &spec.bytes, endianness)
                .map_err(|e| e.in_entry(name.clone()))?;
            tensors.insert(name, tensor);
        }

        debug!("Decoded batch of {} tensors", tensors.len());
        Ok(tensors)
    }
}

/// Process-wide registry holding the built-in strategies
pub fn global_registry() -> &'static FactoryRegistry {
    static REGISTRY: OnceLock<FactoryRegistry> = OnceLock::new();
    REGISTRY.get_or_init(FactoryRegistry::with_defaults)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::F32Decoder;
    use tessera_tensor::TensorError;

    #[derive(Debug)]
    struct LittleOnlyI8;

    impl DecodeStrategy for LittleOnlyI8 {
        fn dtype(&self) -> DType {
            DType::Int8
        }

        fn supports(&self, endianness: Endianness) -> bool {
            endianness == Endianness::Little
        }

        fn decode(&self, bytes: &[u8], shape: Shape, _endianness: Endianness) -> Result<AnyTensor> {
            let values = bytes.iter().map(|&b| (b as i8).saturating_mul(2)).collect();
            Ok(tessera_tensor::Tensor::<tessera_tensor::Int8Backend>::from_vec(values, shape)?.into())
        }
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let mut registry = FactoryRegistry::new();
        assert!(registry.registered_dtypes().is_empty());
        registry.initialize();
        registry.initialize();
        assert!(registry.is_initialized());
        assert_eq!(registry.registered_dtypes(), DType::ALL.to_vec());
    }

    #[test]
    fn test_unregistered_dtype_names_registered_set() {
        let mut registry = FactoryRegistry::new();
        registry.register(Box::new(F32Decoder));

        let err = registry.create_tensor(DType::Int8, &[2], &[1, 2]).unwrap_err();
        match err {
            FactoryError::UnregisteredDType { requested, registered } => {
                assert_eq!(requested, DType::Int8);
                assert_eq!(registered, vec![DType::Fp32]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_custom_strategy_survives_initialize() {
        let mut registry = FactoryRegistry::new();
        assert!(registry.register(Box::new(LittleOnlyI8)).is_none());
        registry.initialize();

        let t = registry.create_tensor(DType::Int8, &[2], &[3, 100]).unwrap();
        assert_eq!(t.as_int8().unwrap().to_vec(), vec![6, 127]);

        let err = registry
            .create_tensor_with(DType::Int8, &[2], &[3, 100], Endianness::Big)
            .unwrap_err();
        assert!(matches!(err, FactoryError::NotImplemented { dtype: DType::Int8, .. }));
    }

    #[test]
    fn test_shape_validated_before_dispatch() {
        let registry = FactoryRegistry::new();
        let err = registry.create_tensor(DType::Fp32, &[2, 0], &[]).unwrap_err();
        assert!(err.tensor_error().is_some_and(TensorError::is_validation_error));

        let err = registry.create_tensor(DType::Fp32, &[1, 1, 1, 1, 1], &[0; 4]).unwrap_err();
        assert!(err.tensor_error().is_some());
    }

    #[test]
    fn test_size_limit() {
        let config = FactoryConfig {
            max_tensor_bytes: 8,
            ..FactoryConfig::default()
        };
        let mut registry = FactoryRegistry::with_config(config);
        registry.initialize();
        let err = registry.create_tensor(DType::Int8, &[16], &[0; 16]).unwrap_err();
        assert!(matches!(err, FactoryError::InputTooLarge { bytes: 16, limit: 8 }));
    }

    #[test]
    fn test_global_registry_is_initialized() {
        assert!(global_registry().is_initialized());
        assert!(std::ptr::eq(global_registry(), global_registry()));
    }
}
