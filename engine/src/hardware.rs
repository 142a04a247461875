use async_trait::async_trait;
use mcw_core::errors::{WalletError, MAX_HARDWARE_INPUTS_OUTPUTS};
use mcw_core::transaction::{TransactionInput, TransactionOutput};

/// What a hardware device needs to sign a transaction: the same
/// input/output shape the unsigned encoding was built from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HardwareSignRequest {
    pub coin_symbol: String,
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TransactionOutput>,
    /// Inner hash for hour-bearing chains; the device signs it per input.
    pub inner_hash: Option<String>,
}

/// Raw signature bytes as returned by the device, matched 1:1 with the
/// request's input list in device order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HardwareSignature(pub Vec<u8>);

/// Device I/O contract. The transport itself (USB/HID) is external; only
/// the request/response shape is owned here.
#[async_trait]
pub trait HardwareSigner: Send + Sync {
    async fn sign_transaction(
        &self,
        request: &HardwareSignRequest,
    ) -> Result<Vec<HardwareSignature>, WalletError>;
}

/// Rejects transaction shapes the devices cannot display or hold in
/// memory. Must run before any device I/O is attempted.
pub fn check_hardware_limits(inputs: usize, outputs: usize) -> Result<(), WalletError> {
    if inputs > MAX_HARDWARE_INPUTS_OUTPUTS {
        return Err(WalletError::TooManyInputsOutputs {
            kind: "inputs",
            count: inputs,
            max: MAX_HARDWARE_INPUTS_OUTPUTS,
        });
    }
    if outputs > MAX_HARDWARE_INPUTS_OUTPUTS {
        return Err(WalletError::TooManyInputsOutputs {
            kind: "outputs",
            count: outputs,
            max: MAX_HARDWARE_INPUTS_OUTPUTS,
        });
    }
    Ok(())
}

/// Checks the device answered with exactly one signature per input.
pub fn check_signature_count(
    signatures: &[HardwareSignature],
    inputs: usize,
) -> Result<(), WalletError> {
    if signatures.len() != inputs {
        return Err(WalletError::InvalidSignatureCount {
            expected: inputs,
            found: signatures.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits() {
        assert!(check_hardware_limits(8, 8).is_ok());
        assert!(matches!(
            check_hardware_limits(9, 1),
            Err(WalletError::TooManyInputsOutputs { kind: "inputs", .. })
        ));
        assert!(matches!(
            check_hardware_limits(1, 9),
            Err(WalletError::TooManyInputsOutputs {
                kind: "outputs",
                ..
            })
        ));
    }

    #[test]
    fn test_signature_count() {
        let signatures = vec![HardwareSignature(vec![0; 65]); 2];
        assert!(check_signature_count(&signatures, 2).is_ok());
        assert!(matches!(
            check_signature_count(&signatures, 3),
            Err(WalletError::InvalidSignatureCount {
                expected: 3,
                found: 2
            })
        ));
    }
}
