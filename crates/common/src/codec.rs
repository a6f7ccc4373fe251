use serde::{de::DeserializeOwned, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("bincode error: {0}")]
    Bincode(#[from] bincode::Error),
}

/// Binary encoding for everything that ends up in the datastore.
pub trait Encoded: Serialize + DeserializeOwned {
    fn encode(&self) -> Result<Vec<u8>, CodecError> {
        Ok(bincode::serialize(self)?)
    }

    fn decode(data: &[u8]) -> Result<Self, CodecError> {
        Ok(bincode::deserialize(data)?)
    }
}

#[cfg(test)]
mod test {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        data: Vec<u8>,
    }

    impl Encoded for Sample {}

    #[test]
    fn test_decode_garbage_fails() {
        let sample = Sample {
            name: "a".into(),
            data: vec![1, 2, 3],
        };
        let bytes = sample.encode().unwrap();
        assert_eq!(Sample::decode(&bytes).unwrap(), sample);
        assert!(Sample::decode(&bytes[..bytes.len() - 1]).is_err());
        assert!(Sample::decode(&[0xff; 4]).is_err());
    }
}
