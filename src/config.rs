use core::num::NonZeroU32;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Arg, ArgMatches, Command};

use crate::entities::{PostId, UserId};
use crate::repositories::MEMBERSHIP_FILTER_CAP;

/// Paging and fan-in bounds shared by every read path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// following-set members a follow-graph feed query may carry
    pub max_graph_fan_in: usize,
    /// upper bound of the recommendation candidate fetch
    pub candidate_pool: usize,
    pub default_page: usize,
    pub max_page: usize,
    pub default_recommendations: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_graph_fan_in: MEMBERSHIP_FILTER_CAP,
            candidate_pool: 200,
            default_page: 20,
            max_page: 100,
            default_recommendations: 10,
        }
    }
}

impl Limits {
    pub fn validate(self) -> Result<Self> {
        if self.max_graph_fan_in == 0 || self.max_graph_fan_in > MEMBERSHIP_FILTER_CAP {
            bail!(
                "max graph fan-in must be within 1..={} (got {})",
                MEMBERSHIP_FILTER_CAP,
                self.max_graph_fan_in
            );
        }
        if self.default_page == 0 || self.max_page == 0 || self.candidate_pool == 0 {
            bail!("page sizes must be positive: {:?}", self);
        }
        if self.default_page > self.max_page {
            bail!(
                "default page ({}) exceeds max page ({})",
                self.default_page,
                self.max_page
            );
        }

        Ok(self)
    }

    /// Missing or zero falls back to the default, anything else is clamped to the max.
    pub fn page(&self, requested: Option<usize>) -> usize {
        match requested {
            None | Some(0) => self.default_page,
            Some(n) => n.min(self.max_page),
        }
    }

    pub fn recommendations(&self, requested: Option<usize>) -> usize {
        match requested {
            None | Some(0) => self.default_recommendations,
            Some(n) => n.min(self.max_page),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Store {
    Memory,
    Mongo { uri: String, db: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind: SocketAddr,
    pub store: Store,
    pub limits: Limits,
    /// fixture file loaded into the in-memory store before serving
    pub seed: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Serve,
    /// empty target lists mean every user and every post
    Reconcile {
        users: Vec<UserId>,
        posts: Vec<PostId>,
    },
}

pub fn parse_nonzero_num(
    s: &str,
) -> ::core::result::Result<u32, <NonZeroU32 as ::core::str::FromStr>::Err> {
    Ok(s.parse::<NonZeroU32>()?.get())
}

pub fn create_clap_app() -> Command<'static> {
    Command::new("fanbase")
        .version(env!("CARGO_PKG_VERSION"))
        .about("fan-community social graph and engagement service")
        .arg(
            Arg::new("bind")
                .long("bind")
                .env("FANBASE_BIND")
                .takes_value(true)
                .default_value("0.0.0.0:8080"),
        )
        .arg(
            Arg::new("store")
                .long("store")
                .env("FANBASE_STORE")
                .takes_value(true)
                .possible_values(["memory", "mongo"])
                .default_value("memory"),
        )
        .arg(
            Arg::new("mongo-uri")
                .long("mongo-uri")
                .env("FANBASE_MONGO_URI")
                .takes_value(true)
                .default_value("mongodb://localhost:27017"),
        )
        .arg(
            Arg::new("mongo-db")
                .long("mongo-db")
                .env("FANBASE_MONGO_DB")
                .takes_value(true)
                .default_value("fanbase"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .env("FANBASE_SEED")
                .takes_value(true),
        )
        .arg(
            Arg::new("max-graph-fan-in")
                .long("max-graph-fan-in")
                .env("FANBASE_MAX_GRAPH_FAN_IN")
                .takes_value(true)
                .validator(parse_nonzero_num),
        )
        .arg(
            Arg::new("candidate-pool")
                .long("candidate-pool")
                .env("FANBASE_CANDIDATE_POOL")
                .takes_value(true)
                .validator(parse_nonzero_num),
        )
        .arg(
            Arg::new("max-page")
                .long("max-page")
                .env("FANBASE_MAX_PAGE")
                .takes_value(true)
                .validator(parse_nonzero_num),
        )
        .subcommand(Command::new("serve").about("run the HTTP service (default)"))
        .subcommand(
            Command::new("reconcile")
                .about("recompute denormalized counters from source records")
                .arg(
                    Arg::new("user")
                        .long("user")
                        .takes_value(true)
                        .multiple_occurrences(true),
                )
                .arg(
                    Arg::new("post")
                        .long("post")
                        .takes_value(true)
                        .multiple_occurrences(true),
                ),
        )
}

#[inline]
fn extract_clap_arg<'a>(ams: &'a ArgMatches, name: &str) -> Result<&'a str> {
    match ams.value_of(name) {
        Some(s) => Ok(s),
        None => bail!("cannot get arg: {}", name),
    }
}

fn extract_num(ams: &ArgMatches, name: &str) -> Result<Option<usize>> {
    match ams.value_of(name) {
        Some(s) => Ok(Some(parse_nonzero_num(s).with_context(|| name.to_string())? as usize)),
        None => Ok(None),
    }
}

pub fn parse_from<I, T>(args: I) -> Result<(Config, Mode)>
where
    I: IntoIterator<Item = T>,
    T: Into<::std::ffi::OsString> + Clone,
{
    let ams = create_clap_app().try_get_matches_from(args)?;

    let bind = extract_clap_arg(&ams, "bind")?
        .parse::<SocketAddr>()
        .context("invalid bind address")?;

    let store = match extract_clap_arg(&ams, "store")? {
        "mongo" => Store::Mongo {
            uri: extract_clap_arg(&ams, "mongo-uri")?.to_string(),
            db: extract_clap_arg(&ams, "mongo-db")?.to_string(),
        },
        _ => Store::Memory,
    };

    let seed = ams.value_of("seed").map(PathBuf::from);
    if seed.is_some() && store != Store::Memory {
        bail!("--seed only applies to the memory store");
    }

    let mut limits = Limits::default();
    if let Some(n) = extract_num(&ams, "max-graph-fan-in")? {
        limits.max_graph_fan_in = n;
    }
    if let Some(n) = extract_num(&ams, "candidate-pool")? {
        limits.candidate_pool = n;
    }
    if let Some(n) = extract_num(&ams, "max-page")? {
        limits.max_page = n;
        limits.default_page = limits.default_page.min(n);
    }
    let limits = limits.validate()?;

    let mode = match ams.subcommand() {
        Some(("reconcile", sams)) => {
            let users = sams
                .values_of("user")
                .map(|v| v.map(UserId::from).collect())
                .unwrap_or_default();
            let posts = sams
                .values_of("post")
                .map(|v| v.map(str::parse::<PostId>).collect::<Result<Vec<_>, _>>())
                .transpose()
                .context("invalid post id")?
                .unwrap_or_default();

            Mode::Reconcile { users, posts }
        },
        _ => Mode::Serve,
    };

    Ok((
        Config {
            bind,
            store,
            limits,
            seed,
        },
        mode,
    ))
}
