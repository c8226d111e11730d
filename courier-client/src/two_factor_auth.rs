//! SRP proof for Telegram 2FA (`account.getPassword` → `auth.checkPassword`).

use courier_tl as tl;
use hmac::Hmac;
use num_bigint::{BigInt, Sign};
use num_traits::ops::euclid::Euclid;
use sha2::{Digest, Sha256, Sha512};

use crate::errors::{AuthError, InvocationError};

fn sha256(parts: &[&[u8]]) -> [u8; 32] {
    let mut h = Sha256::new();
    for p in parts { h.update(p); }
    h.finalize().into()
}

fn sh(data: &[u8], salt: &[u8]) -> [u8; 32] {
    sha256(&[salt, data, salt])
}

fn ph2(password: &[u8], salt1: &[u8], salt2: &[u8]) -> Result<[u8; 32], AuthError> {
    let hash1 = sh(&sh(password, salt1), salt2);
    let mut dk = [0u8; 64];
    pbkdf2::pbkdf2::<Hmac<Sha512>>(&hash1, salt1, 100_000, &mut dk)
        .map_err(|_| AuthError::UnsupportedPasswordAlgo)?;
    Ok(sh(&dk, salt2))
}

fn pad256(data: &[u8]) -> [u8; 256] {
    let mut out = [0u8; 256];
    let tail  = &data[data.len().saturating_sub(256)..];
    out[256 - tail.len()..].copy_from_slice(tail);
    out
}

fn xor32(a: &[u8; 32], b: &[u8; 32]) -> [u8; 32] {
    let mut out = [0u8; 32];
    for (o, (x, y)) in out.iter_mut().zip(a.iter().zip(b)) { *o = x ^ y; }
    out
}

/// Compute SRP `(M1, g_a)` from the server challenge and a client secret `a`.
pub(crate) fn calculate_2fa(
    salt1:    &[u8],
    salt2:    &[u8],
    p:        &[u8],
    g:        i32,
    g_b:      &[u8],
    a:        &[u8],
    password: &[u8],
) -> Result<([u8; 32], [u8; 256]), AuthError> {
    let big_p  = BigInt::from_bytes_be(Sign::Plus, p);
    let g_b    = pad256(g_b);
    let a      = pad256(a);
    let g_hash = pad256(&g.to_be_bytes());

    let big_g_b = BigInt::from_bytes_be(Sign::Plus, &g_b);
    let big_g   = BigInt::from(g);
    let big_a   = BigInt::from_bytes_be(Sign::Plus, &a);

    let big_k = BigInt::from_bytes_be(Sign::Plus, &sha256(&[p, &g_hash]));

    let g_a = pad256(&big_g.modpow(&big_a, &big_p).to_bytes_be().1);

    let big_u = BigInt::from_bytes_be(Sign::Plus, &sha256(&[&g_a, &g_b]));
    let big_x = BigInt::from_bytes_be(Sign::Plus, &ph2(password, salt1, salt2)?);

    let big_v  = big_g.modpow(&big_x, &big_p);
    let big_kv = (big_k * big_v) % &big_p;
    let big_t  = (big_g_b - big_kv).rem_euclid(&big_p);

    let big_sa = big_t.modpow(&(big_a + big_u * big_x), &big_p);
    let k_a    = sha256(&[&pad256(&big_sa.to_bytes_be().1)]);

    let p_xg = xor32(&sha256(&[p]), &sha256(&[&g_hash]));
    let m1   = sha256(&[&p_xg, &sha256(&[salt1]), &sha256(&[salt2]), &g_a, &g_b, &k_a]);

    Ok((m1, g_a))
}

/// Build the `InputCheckPasswordSRP` answering `password`'s challenge.
pub(crate) fn check_password_srp(
    challenge: &tl::types::account::Password,
    secret:    &[u8],
) -> Result<tl::enums::InputCheckPasswordSrp, AuthError> {
    let algo = match &challenge.current_algo {
        Some(tl::enums::PasswordKdfAlgo::Sha256Sha256Pbkdf2HmacSha512iter100000Sha256ModPow(a)) => a,
        Some(tl::enums::PasswordKdfAlgo::Unknown) => return Err(AuthError::UnsupportedPasswordAlgo),
        None => return Err(AuthError::Invocation(InvocationError::UnexpectedResult {
            call: "account.getPassword",
            got:  "Password without current_algo",
        })),
    };
    let (srp_b, srp_id) = match (&challenge.srp_b, challenge.srp_id) {
        (Some(b), Some(id)) => (b, id),
        _ => return Err(AuthError::Invocation(InvocationError::UnexpectedResult {
            call: "account.getPassword",
            got:  "Password without srp_b",
        })),
    };

    let mut a = [0u8; 256];
    getrandom::getrandom(&mut a)
        .map_err(|e| InvocationError::Io(std::io::Error::other(e.to_string())))?;

    let (m1, g_a) = calculate_2fa(&algo.salt1, &algo.salt2, &algo.p, algo.g, srp_b, &a, secret)?;
    Ok(tl::enums::InputCheckPasswordSrp::InputCheckPasswordSrp(
        tl::types::InputCheckPasswordSrp { srp_id, a: g_a.to_vec(), m1: m1.to_vec() },
    ))
}
