//! Fixed categorical pools the seed run draws from

pub const IPS: &[&str] = &[
    "14.36.183.3",
    "87.114.231.235",
    "167.188.71.253",
    "97.98.109.35",
    "150.77.224.161",
    "222.38.154.82",
    "2.192.52.149",
    "94.82.109.5",
    "83.78.142.31",
    "18.140.192.63",
    "182.55.155.239",
    "152.173.194.120",
    "151.55.119.115",
    "94.136.22.162",
    "227.239.220.84",
    "118.77.77.150",
    "89.151.49.152",
    "223.225.3.224",
    "216.28.206.188",
    "192.227.165.142",
    "59.201.216.70",
    "50.91.187.146",
    "96.99.144.211",
    "223.101.109.26",
    "164.218.136.55",
    "100.197.186.62",
    "193.38.170.2",
    "170.202.114.30",
    "201.139.219.68",
    "134.204.215.203",
];

pub const BROWSERS: &[&str] = &["Chrome", "Firefox", "Safari", "Edge", "Opera", "Other"];

pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64)",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7)",
    "Mozilla/5.0 (X11; Linux x86_64)",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 16_0 like Mac OS X)",
    "Mozilla/5.0 (iPad; CPU OS 15_6 like Mac OS X)",
];

pub const REFERRERS: &[&str] = &[
    "https://google.com",
    "https://bing.com",
    "https://yahoo.com",
    "https://duckduckgo.com",
    "https://reddit.com",
    "https://twitter.com",
    "https://facebook.com",
    "https://linkedin.com",
    "https://stackoverflow.com",
    "direct",
];
