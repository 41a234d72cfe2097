use std::{fmt, str::FromStr};

use rand::Rng;
use serde::{Deserialize, Serialize};

const BASE58_ALPHABET: &[u8] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Network a mock wallet pretends to live on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Demo,
    Evm,
    Solana,
}

impl Network {
    pub fn address_prefix(self) -> &'static str {
        match self {
            Network::Demo => "demo",
            Network::Evm => "0x",
            Network::Solana => "SoL",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Network::Demo => "Demo network",
            Network::Evm => "EVM (testnet)",
            Network::Solana => "Solana (devnet)",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Network::Demo => "demo",
            Network::Evm => "evm",
            Network::Solana => "solana",
        };
        f.write_str(name)
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "demo" => Ok(Network::Demo),
            "evm" | "ethereum" | "eth" => Ok(Network::Evm),
            "solana" | "sol" => Ok(Network::Solana),
            other => Err(format!("unknown network '{other}' (expected demo, evm or solana)")),
        }
    }
}

/// Cosmetic wallet connection. The address is not a credential.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub address: String,
    pub network: Network,
}

impl Wallet {
    pub fn mock<R: Rng + ?Sized>(network: Network, rng: &mut R) -> Self {
        let body = match network {
            Network::Demo => {
                let bytes: [u8; 6] = rng.gen();
                hex::encode(bytes)
            }
            Network::Evm => {
                let bytes: [u8; 20] = rng.gen();
                hex::encode(bytes)
            }
            Network::Solana => (0..41)
                .map(|_| BASE58_ALPHABET[rng.gen_range(0..BASE58_ALPHABET.len())] as char)
                .collect(),
        };
        Self {
            address: format!("{}{}", network.address_prefix(), body),
            network,
        }
    }

    /// `0x1234…abcd` style abbreviation for display.
    pub fn short_address(&self) -> String {
        let chars: Vec<char> = self.address.chars().collect();
        if chars.len() <= 12 {
            return self.address.clone();
        }
        let head: String = chars[..6].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}…{tail}")
    }
}
