//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// Baseline system instruction shared by every category
pub const SYSTEM: &str = include_str!("../../prompts/system.pmt");

/// User instruction: requirements, option lines, closing directive
pub const USER: &str = include_str!("../../prompts/user.pmt");

pub const CATEGORY_ERC20: &str = include_str!("../../prompts/category-erc20.pmt");
pub const CATEGORY_ERC721: &str = include_str!("../../prompts/category-erc721.pmt");
pub const CATEGORY_MULTISIG: &str = include_str!("../../prompts/category-multisig.pmt");
pub const CATEGORY_CROWDFUNDING: &str = include_str!("../../prompts/category-crowdfunding.pmt");
pub const CATEGORY_DEFI: &str = include_str!("../../prompts/category-defi.pmt");
pub const CATEGORY_DAO: &str = include_str!("../../prompts/category-dao.pmt");
pub const CATEGORY_GENERIC: &str = include_str!("../../prompts/category-generic.pmt");

/// Every template name the loader registers
pub const TEMPLATE_NAMES: [&str; 9] = [
    "system",
    "user",
    "category-erc20",
    "category-erc721",
    "category-multisig",
    "category-crowdfunding",
    "category-defi",
    "category-dao",
    "category-generic",
];

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "system" => Some(SYSTEM),
        "user" => Some(USER),
        "category-erc20" => Some(CATEGORY_ERC20),
        "category-erc721" => Some(CATEGORY_ERC721),
        "category-multisig" => Some(CATEGORY_MULTISIG),
        "category-crowdfunding" => Some(CATEGORY_CROWDFUNDING),
        "category-defi" => Some(CATEGORY_DEFI),
        "category-dao" => Some(CATEGORY_DAO),
        "category-generic" => Some(CATEGORY_GENERIC),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}
