/*
    This module helps with parsing ZIP-32 deriveration paths passed in as strings
    as vectors of ChildOptions that can be used to derive a child key.
*/

use std::{fmt, str::FromStr};

use crate::error::{Result, WalletError};

/// ZIP-32 purpose for Sapling keys
pub const SAPLING_PURPOSE: u32 = 32;

/// Indexes at or above this value are reserved for the hardened flag
pub const HARDENED_OFFSET: u32 = 1 << 31;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildOptions {
    Normal(u32),
    Hardened(u32)
}

impl ChildOptions {
    /**
        The raw 32 bit child index, with the top bit set for hardened children.
    */
    pub fn index(&self) -> Result<u32> {
        let i = match self {
            Self::Normal(x) => *x,
            Self::Hardened(x) => *x
        };
        if i >= HARDENED_OFFSET {
            return Err(WalletError::BadPath(format!("index {} is too large", i)))
        }

        Ok(match self {
            Self::Normal(_) => i,
            Self::Hardened(_) => i | HARDENED_OFFSET
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    pub children: Vec<ChildOptions>
}

impl Path {
    /**
        m/32'/coin_type'/account'
    */
    pub fn sapling_account(coin_type: u32, account: u32) -> Result<Self> {
        let path = Self {
            children: vec![
                ChildOptions::Hardened(SAPLING_PURPOSE),
                ChildOptions::Hardened(coin_type),
                ChildOptions::Hardened(account)
            ]
        };
        for child in &path.children {
            child.index()?;
        }

        Ok(path)
    }

    pub fn empty() -> Self {
        Self {
            children: vec![]
        }
    }

    /**
        The account component of a m/32'/coin'/account' path, if that is what this is.
    */
    pub fn account(&self) -> Option<u32> {
        match self.children.as_slice() {
            [ChildOptions::Hardened(SAPLING_PURPOSE), ChildOptions::Hardened(_), ChildOptions::Hardened(a)] => Some(*a),
            _ => None
        }
    }
}

impl FromStr for Path {
    type Err = WalletError;

    fn from_str(path: &str) -> Result<Self> {
        let mut p: Vec<ChildOptions> = vec![];
        let mut children: Vec<&str> = path.split('/').collect();
        if children[0] == "m" {
            children.remove(0);
        } else {
            return Err(WalletError::BadPath(path.to_string()))
        }

        for child in children {
            //A trailing ' or h marks a hardened child
            let option = match child.strip_suffix('\'').or_else(|| child.strip_suffix('h')) {
                Some(index) => match index.parse() {
                    Ok(x) => ChildOptions::Hardened(x),
                    Err(_) => return Err(WalletError::BadPath(path.to_string()))
                },
                None => match child.parse() {
                    Ok(x) => ChildOptions::Normal(x),
                    Err(_) => return Err(WalletError::BadPath(path.to_string()))
                }
            };

            option.index()?;
            p.push(option);
        }

        Ok(Self {
            children: p
        })
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut path: Vec<String> = vec!["m".to_string()];
        for child in &self.children {
            path.push(match child {
                ChildOptions::Normal(x) => format!("{}", x),
                ChildOptions::Hardened(x) => format!("{}'", x)
            });
        }

        write!(f, "{}", path.join("/"))
    }
}
