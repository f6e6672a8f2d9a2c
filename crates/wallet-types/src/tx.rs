//! Transfer transaction records and their canonical message encoding.

use serde::{Deserialize, Serialize};

use crate::ids::{Address, Blockhash, Signature};

const MESSAGE_TAG: &[u8] = b"wallet.session.tx.v1";
const TRANSFER_TAG: u8 = 0x01;
const MEMO_TAG: u8 = 0x02;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    Transfer {
        from: Address,
        to: Address,
        lamports: u64,
    },
    Memo {
        data: Vec<u8>,
    },
}

/// Unsigned transaction: a fee payer, a recent blockhash and ordered instructions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub fee_payer: Address,
    pub recent_blockhash: Blockhash,
    pub instructions: Vec<Instruction>,
}

impl Transaction {
    /// Canonical encoding used as the signing preimage:
    /// 1. Variable-length bytes are length-prefixed with a big-endian u32.
    /// 2. Integers are big-endian fixed width.
    /// 3. Each instruction starts with a one-byte variant tag.
    pub fn message_bytes(&self) -> Vec<u8> {
        let mut enc = Vec::new();
        enc.extend_from_slice(MESSAGE_TAG);
        put_bytes(&mut enc, &self.fee_payer.to_bytes());
        put_bytes(&mut enc, &self.recent_blockhash.to_bytes());
        put_u32(&mut enc, self.instructions.len() as u32);
        for instruction in &self.instructions {
            match instruction {
                Instruction::Transfer { from, to, lamports } => {
                    enc.push(TRANSFER_TAG);
                    put_bytes(&mut enc, &from.to_bytes());
                    put_bytes(&mut enc, &to.to_bytes());
                    enc.extend_from_slice(&lamports.to_be_bytes());
                }
                Instruction::Memo { data } => {
                    enc.push(MEMO_TAG);
                    put_bytes(&mut enc, data);
                }
            }
        }
        enc
    }

    pub fn transfers(&self) -> impl Iterator<Item = (&Address, &Address, u64)> {
        self.instructions.iter().filter_map(|ix| match ix {
            Instruction::Transfer { from, to, lamports } => Some((from, to, *lamports)),
            Instruction::Memo { .. } => None,
        })
    }

    pub fn memo(&self) -> Option<&[u8]> {
        self.instructions.iter().find_map(|ix| match ix {
            Instruction::Memo { data } => Some(data.as_slice()),
            Instruction::Transfer { .. } => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub transaction: Transaction,
    pub signature: Signature,
}

fn put_u32(enc: &mut Vec<u8>, value: u32) {
    enc.extend_from_slice(&value.to_be_bytes());
}

fn put_bytes(enc: &mut Vec<u8>, bytes: &[u8]) {
    put_u32(enc, bytes.len() as u32);
    enc.extend_from_slice(bytes);
}

#[cfg(test)]
mod tests {
    use super::{Instruction, Transaction};
    use crate::ids::{Address, Blockhash};

    fn tx(memo: Option<&str>) -> Transaction {
        let from = Address::parse("Addr1").unwrap();
        let to = Address::parse("Addr2").unwrap();
        let mut instructions = vec![Instruction::Transfer {
            from: from.clone(),
            to,
            lamports: 42,
        }];
        if let Some(memo) = memo {
            instructions.push(Instruction::Memo {
                data: memo.as_bytes().to_vec(),
            });
        }
        Transaction {
            fee_payer: from,
            recent_blockhash: Blockhash::from_bytes(&[9u8; 32]),
            instructions,
        }
    }

    #[test]
    fn message_bytes_commit_to_memo() {
        assert_ne!(tx(None).message_bytes(), tx(Some("tuition")).message_bytes());
        assert_ne!(
            tx(Some("tuition")).message_bytes(),
            tx(Some("tuitiom")).message_bytes()
        );
        assert_eq!(tx(Some("a")).message_bytes(), tx(Some("a")).message_bytes());
    }

    #[test]
    fn accessors_find_transfer_and_memo() {
        let tx = tx(Some("tuition"));
        let transfers: Vec<_> = tx.transfers().collect();
        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0].2, 42);
        assert_eq!(tx.memo(), Some("tuition".as_bytes()));
    }
}
