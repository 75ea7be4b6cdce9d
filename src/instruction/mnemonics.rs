pub type Mnemonic = &'static str;

pub const ALL_MNEMONICS: [Mnemonic; 9] = [
    RXOR,
    RADD,
    RSWAP,
    BEQ,
    ADD,
    SUB,
    LOAD,
    STORE,
    HALT,
];

pub const RXOR: Mnemonic  = "RXOR";
pub const RADD: Mnemonic  = "RADD";
pub const RSWAP: Mnemonic = "RSWAP";
pub const BEQ: Mnemonic   = "BEQ";
pub const ADD: Mnemonic   = "ADD";
pub const SUB: Mnemonic   = "SUB";
pub const LOAD: Mnemonic  = "LOAD";
pub const STORE: Mnemonic = "STORE";
pub const HALT: Mnemonic  = "HALT";
