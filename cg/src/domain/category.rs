//! Contract template categories

use serde::{Deserialize, Serialize};

/// Template category guiding prompt content
///
/// Declaration order matters: the classifier returns the first category whose
/// keywords match, so earlier variants win ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Fungible token (ERC-20)
    Erc20,
    /// Non-fungible token (ERC-721)
    Erc721,
    /// Multi-party approval wallet
    MultiSig,
    /// Fundraising campaign
    Crowdfunding,
    /// Yield protocol (staking, farming, vaults)
    DeFi,
    /// On-chain governance
    Dao,
    /// Anything else
    Generic,
}

impl Category {
    /// All categories in declaration order
    pub const ALL: [Category; 7] = [
        Category::Erc20,
        Category::Erc721,
        Category::MultiSig,
        Category::Crowdfunding,
        Category::DeFi,
        Category::Dao,
        Category::Generic,
    ];

    /// Stable identifier used on the wire and in config
    pub fn id(&self) -> &'static str {
        match self {
            Self::Erc20 => "erc20",
            Self::Erc721 => "erc721",
            Self::MultiSig => "multisig",
            Self::Crowdfunding => "crowdfunding",
            Self::DeFi => "defi",
            Self::Dao => "dao",
            Self::Generic => "generic",
        }
    }

    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Erc20 => "ERC-20 Token",
            Self::Erc721 => "ERC-721 NFT",
            Self::MultiSig => "Multi-Signature Wallet",
            Self::Crowdfunding => "Crowdfunding Campaign",
            Self::DeFi => "DeFi Staking Protocol",
            Self::Dao => "DAO Governance",
            Self::Generic => "Custom Contract",
        }
    }

    /// Default keywords (lowercase, matched as substrings)
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Self::Erc20 => &[
                "erc20",
                "erc-20",
                "erc 20",
                "utility token",
                "a fungible token",
                "a token named",
                "a token called",
                "token supply",
                "coin",
                "currency",
                "mintable token",
                "burnable token",
            ],
            Self::Erc721 => &[
                "erc721",
                "erc-721",
                "erc 721",
                "nft",
                "non-fungible",
                "non fungible",
                "collectible",
                "digital art",
            ],
            Self::MultiSig => &[
                "multisig",
                "multi-sig",
                "multi sig",
                "multi-signature",
                "multisignature",
                "multiple owners",
                "signers",
            ],
            Self::Crowdfunding => &[
                "crowdfund",
                "crowdsale",
                "fundrais",
                "funding goal",
                "campaign",
                "donation",
            ],
            Self::DeFi => &[
                "defi",
                "staking",
                "stake",
                "yield",
                "liquidity",
                "lending",
                "farming",
                "vault",
            ],
            Self::Dao => &["dao", "governance", "proposal", "voting", "vote"],
            Self::Generic => &[],
        }
    }

    /// Name of the prompt template holding this category's instruction block
    pub fn template_name(&self) -> &'static str {
        match self {
            Self::Erc20 => "category-erc20",
            Self::Erc721 => "category-erc721",
            Self::MultiSig => "category-multisig",
            Self::Crowdfunding => "category-crowdfunding",
            Self::DeFi => "category-defi",
            Self::Dao => "category-dao",
            Self::Generic => "category-generic",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "erc20" | "erc-20" | "token" => Ok(Self::Erc20),
            "erc721" | "erc-721" | "nft" => Ok(Self::Erc721),
            "multisig" | "multi-sig" => Ok(Self::MultiSig),
            "crowdfunding" | "crowdfund" => Ok(Self::Crowdfunding),
            "defi" | "staking" => Ok(Self::DeFi),
            "dao" | "governance" => Ok(Self::Dao),
            "generic" | "custom" => Ok(Self::Generic),
            _ => Err(format!(
                "Unsupported category: '{}'. Supported: {}",
                s,
                Category::ALL.iter().map(|c| c.id()).collect::<Vec<_>>().join(", ")
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse() {
        assert_eq!("erc20".parse::<Category>().unwrap(), Category::Erc20);
        assert_eq!("ERC-721".parse::<Category>().unwrap(), Category::Erc721);
        assert_eq!(" custom ".parse::<Category>().unwrap(), Category::Generic);
        assert_eq!("MultiSig".parse::<Category>().unwrap(), Category::MultiSig);
        assert!("lottery".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_display_matches_serde() {
        for category in Category::ALL {
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{}\"", category));
        }
    }

    #[test]
    fn test_every_id_round_trips() {
        for category in Category::ALL {
            assert_eq!(category.id().parse::<Category>().unwrap(), category);
        }
    }

    #[test]
    fn test_keywords_are_lowercase() {
        for category in Category::ALL {
            for keyword in category.keywords() {
                assert_eq!(*keyword, keyword.to_lowercase(), "{} keyword not lowercase", category);
            }
        }
    }

    #[test]
    fn test_no_keyword_contains_an_earlier_categorys_keyword() {
        // Otherwise a later category could never win on its own keyword
        for (i, category) in Category::ALL.iter().enumerate() {
            for keyword in category.keywords() {
                for earlier in &Category::ALL[..i] {
                    for earlier_kw in earlier.keywords() {
                        assert!(
                            !keyword.contains(earlier_kw),
                            "{}:{} shadowed by {}:{}",
                            category,
                            keyword,
                            earlier,
                            earlier_kw
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_generic_has_no_keywords() {
        assert!(Category::Generic.keywords().is_empty());
    }
}
