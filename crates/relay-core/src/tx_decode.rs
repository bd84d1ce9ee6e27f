//! Decodes the payment-relevant fields out of a sponsored transaction's
//! opaque byte sequence. Spec §3: "Sponsored transaction (wire)" is an
//! opaque byte sequence; decoding it into sender auth, recipient, amount and
//! (for SIP-010 calls) the target contract is Clarity/Stacks
//! transaction-format work with no counterpart anywhere in the pack.
//!
//! [`FixedLayoutDecoder`] implements [`crate::sponsor_pipeline::TxDecoder`]
//! against a simple length-prefixed layout so the rest of the pipeline has a
//! concrete, exercisable decoder to run against. Swapping in a real
//! `stacks-transactions`-style codec is the one seam a production
//! deployment would need to replace.

use crate::settlement_engine::ParsedPayment;
use crate::sponsor_pipeline::TxDecoder;
use relay_types::money::Amount;

/// Layout: `sender_len:u8 | sender | recipient_len:u8 | recipient |
/// amount:16 bytes BE | contract_len:u8 | contract?`. A `contract_len` of 0
/// means a plain STX transfer.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedLayoutDecoder;

impl TxDecoder for FixedLayoutDecoder {
    fn decode(&self, tx_hex: &str) -> Result<ParsedPayment, ()> {
        let bytes = hex::decode(tx_hex.trim_start_matches("0x")).map_err(|_| ())?;
        let mut cursor = 0usize;

        let sender = read_prefixed_string(&bytes, &mut cursor)?;
        let recipient = read_prefixed_string(&bytes, &mut cursor)?;

        let amount_bytes: [u8; 16] = bytes.get(cursor..cursor + 16).ok_or(())?.try_into().map_err(|_| ())?;
        cursor += 16;
        let amount = Amount(u128::from_be_bytes(amount_bytes));

        let contract_id = match read_prefixed_string(&bytes, &mut cursor) {
            Ok(s) if s.is_empty() => None,
            Ok(s) => Some(s),
            Err(()) => None,
        };

        Ok(ParsedPayment { sender, recipient, amount, contract_id })
    }
}

fn read_prefixed_string(bytes: &[u8], cursor: &mut usize) -> Result<String, ()> {
    let len = *bytes.get(*cursor).ok_or(())? as usize;
    *cursor += 1;
    let slice = bytes.get(*cursor..*cursor + len).ok_or(())?;
    *cursor += len;
    String::from_utf8(slice.to_vec()).map_err(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(sender: &str, recipient: &str, amount: u128, contract_id: Option<&str>) -> String {
        let mut bytes = Vec::new();
        bytes.push(sender.len() as u8);
        bytes.extend_from_slice(sender.as_bytes());
        bytes.push(recipient.len() as u8);
        bytes.extend_from_slice(recipient.as_bytes());
        bytes.extend_from_slice(&amount.to_be_bytes());
        let contract = contract_id.unwrap_or("");
        bytes.push(contract.len() as u8);
        bytes.extend_from_slice(contract.as_bytes());
        hex::encode(bytes)
    }

    #[test]
    fn decodes_a_plain_transfer() {
        let tx_hex = encode("SP_SENDER", "SP_RECIPIENT", 1000, None);
        let payment = FixedLayoutDecoder.decode(&tx_hex).unwrap();
        assert_eq!(payment.sender, "SP_SENDER");
        assert_eq!(payment.recipient, "SP_RECIPIENT");
        assert_eq!(payment.amount, Amount(1000));
        assert!(payment.contract_id.is_none());
    }

    #[test]
    fn decodes_a_contract_call() {
        let tx_hex = encode("SP_SENDER", "SP_RECIPIENT", 2000, Some("SP_X.token-foo"));
        let payment = FixedLayoutDecoder.decode(&tx_hex).unwrap();
        assert_eq!(payment.contract_id.as_deref(), Some("SP_X.token-foo"));
    }

    #[test]
    fn rejects_truncated_input() {
        assert!(FixedLayoutDecoder.decode("00").is_err());
    }
}
