//! Data models for ghstars.
//!
//! This module contains the domain models:
//! - Repository
//! - Owner, LicenseInfo, Release, Topic, FundingLink

pub mod repository;

pub use repository::{
    FundingLink, FundingPlatform, LicenseInfo, OTHER_LANGUAGE, Owner, Release, Repository, Topic,
};
