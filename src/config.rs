use crate::block::sample_count;
use crate::compression::dct::IdctStrategy;
use crate::compression::quantizer::{QuantizationTable, DEFAULT_LEVEL_SHIFT};
use crate::error::{CodecError, CodecResult};
use crate::format::stream::SampleFormat;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub block_size: usize,
    pub strategy: IdctStrategy,
    pub level_shift: f64,
    /// `None` keeps every coefficient, only rounded to an integer.
    pub quality: Option<u8>,
    pub sample_format: SampleFormat,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            block_size: 8,
            strategy: IdctStrategy::Direct,
            level_shift: DEFAULT_LEVEL_SHIFT,
            quality: None,
            sample_format: SampleFormat::U8,
        }
    }
}

impl PipelineConfig {
    pub fn lossy(quality: u8) -> Self {
        Self {
            quality: Some(quality.clamp(1, 100)),
            ..Self::default()
        }
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn with_strategy(mut self, strategy: IdctStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_level_shift(mut self, level_shift: f64) -> Self {
        self.level_shift = level_shift;
        self
    }

    pub fn with_sample_format(mut self, sample_format: SampleFormat) -> Self {
        self.sample_format = sample_format;
        self
    }

    pub fn validate(&self) -> CodecResult<()> {
        sample_count(self.block_size)
            .map_err(|e| CodecError::ConfigError(format!("block_size: {}", e)))?;
        if !self.level_shift.is_finite() {
            return Err(CodecError::ConfigError(format!(
                "level_shift must be finite, got {}",
                self.level_shift
            )));
        }
        if let Some(q) = self.quality {
            if !(1..=100).contains(&q) {
                return Err(CodecError::ConfigError(format!(
                    "quality must be in 1..=100, got {}",
                    q
                )));
            }
            if self.block_size != QuantizationTable::SIZE {
                return Err(CodecError::ConfigError(format!(
                    "quantization needs {}x{} blocks, configured {}x{}",
                    QuantizationTable::SIZE,
                    QuantizationTable::SIZE,
                    self.block_size,
                    self.block_size
                )));
            }
        }
        Ok(())
    }

    pub fn quant_table(&self) -> Option<QuantizationTable> {
        self.quality.map(QuantizationTable::for_quality)
    }

    pub fn to_bytes(&self) -> CodecResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| CodecError::ConfigError(e.to_string()))
    }

    pub fn from_bytes(data: &[u8]) -> CodecResult<Self> {
        let config: Self =
            bincode::deserialize(data).map_err(|e| CodecError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.block_size, 8);
        assert!(config.quant_table().is_none());
    }

    #[test]
    fn test_bytes_roundtrip() {
        let config = PipelineConfig::lossy(75)
            .with_strategy(IdctStrategy::TransposeDoublePass)
            .with_sample_format(SampleFormat::F32Le);
        let bytes = config.to_bytes().unwrap();
        assert_eq!(PipelineConfig::from_bytes(&bytes).unwrap(), config);
    }

    #[test]
    fn test_rejects_bad_settings() {
        assert!(PipelineConfig::default()
            .with_block_size(0)
            .validate()
            .is_err());
        assert!(PipelineConfig::lossy(50)
            .with_block_size(4)
            .validate()
            .is_err());
        assert!(PipelineConfig::default()
            .with_level_shift(f64::NAN)
            .validate()
            .is_err());
        assert!(matches!(
            PipelineConfig::default()
                .with_block_size(usize::MAX)
                .validate(),
            Err(CodecError::ConfigError(_))
        ));
        assert!(PipelineConfig::default().with_block_size(4).validate().is_ok());
    }

    #[test]
    fn test_from_bytes_validates() {
        let bad = PipelineConfig::lossy(50).with_block_size(16);
        let bytes = bad.to_bytes().unwrap();
        assert!(matches!(
            PipelineConfig::from_bytes(&bytes),
            Err(CodecError::ConfigError(_))
        ));
        assert!(PipelineConfig::from_bytes(&[1, 2]).is_err());
    }
}
